//! Loading and saving diagrams as DOT files.
//!
//! A missing file or one that is not DOT at all yields a fresh empty
//! diagram. A DOT file holding an invalid statement is an error.

use crate::config::ClientConfig;
use crate::error::{DfdError, Result};
use crate::export::{export_dot, export_dot_styled, DotOptions};
use crate::generator::generate;
use crate::graph::DataFlowDiagram;
use log::{info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

/// Parse DOT text into a diagram.
///
/// # Errors
///
/// Returns [`DfdError::Syntax`] if the text is not DOT, and any error of
/// [`generate`] for DOT that does not describe a diagram.
pub fn parse_diagram(text: &str) -> Result<DataFlowDiagram> {
    let graph = dfd_dot::parse_graph(text)?;
    generate(&graph)
}

/// Load a diagram from a DOT file.
///
/// Returns an empty diagram with a fresh ID if the file does not exist or
/// does not parse as DOT.
///
/// # Errors
///
/// Returns [`DfdError::Io`] if the file exists but cannot be read, and the
/// generator's error if the file parses but holds an invalid statement.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<DataFlowDiagram> {
    let path = path.as_ref();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No diagram at {}, starting empty", path.display());
            return Ok(DataFlowDiagram::initialize(""));
        }
        Err(e) => return Err(DfdError::io(path, e)),
    };
    let Ok(text) = String::from_utf8(bytes) else {
        warn!("Diagram at {} is not UTF-8, starting empty", path.display());
        return Ok(DataFlowDiagram::initialize(""));
    };

    match parse_diagram(&text) {
        Ok(diagram) => {
            info!(
                "Loaded diagram {} from {}",
                diagram.external_id(),
                path.display()
            );
            Ok(diagram)
        }
        Err(e) if e.is_recoverable() => {
            warn!("Diagram at {} does not parse ({e}), starting empty", path.display());
            Ok(DataFlowDiagram::initialize(""))
        }
        Err(e) => Err(e),
    }
}

/// Write a diagram to a DOT file, replacing its contents.
///
/// Returns the text written.
pub fn save_to_path<P: AsRef<Path>>(path: P, diagram: &DataFlowDiagram) -> Result<String> {
    let dot = export_dot(diagram)?;
    write_dot(path.as_ref(), &dot)?;
    Ok(dot)
}

fn write_dot(path: &Path, dot: &str) -> Result<()> {
    fs::write(path, dot).map_err(|e| DfdError::io(path, e))?;
    info!("Saved diagram to {} ({} bytes)", path.display(), dot.len());
    Ok(())
}

/// A diagram bound to its DOT file.
///
/// # Example
///
/// ```rust,no_run
/// use dfd::{Client, ClientConfig, DfdGraph, Node};
///
/// let client = Client::new(ClientConfig::default().with_dot_path("app.dot")).unwrap();
/// client.diagram().add_node_elem(Node::process("API")).unwrap();
/// client.save().unwrap();
/// ```
#[derive(Debug)]
pub struct Client {
    config: ClientConfig,
    diagram: Arc<DataFlowDiagram>,
}

impl Client {
    /// Create a client and load its diagram from the configured path.
    ///
    /// # Errors
    ///
    /// See [`load_from_path`].
    pub fn new(config: ClientConfig) -> Result<Self> {
        let diagram = Arc::new(load_from_path(&config.dot_path)?);
        Ok(Self { config, diagram })
    }

    /// Create a client for `path` with default settings.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(ClientConfig::default().with_dot_path(path.as_ref()))
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shared handle to the current diagram.
    pub fn diagram(&self) -> Arc<DataFlowDiagram> {
        Arc::clone(&self.diagram)
    }

    /// Replace the current diagram.
    pub fn set_diagram(&mut self, diagram: Arc<DataFlowDiagram>) {
        self.diagram = diagram;
    }

    /// Reload the diagram from disk, discarding in-memory changes.
    pub fn reload(&mut self) -> Result<Arc<DataFlowDiagram>> {
        self.diagram = Arc::new(load_from_path(&self.config.dot_path)?);
        Ok(self.diagram())
    }

    /// Export the current diagram with the configured layout.
    pub fn to_dot(&self) -> Result<String> {
        export_dot_styled(&self.diagram, self.dot_options())
    }

    /// Write the current diagram to the configured path.
    ///
    /// Returns the text written.
    pub fn save(&self) -> Result<String> {
        let dot = self.to_dot()?;
        write_dot(&self.config.dot_path, &dot)?;
        Ok(dot)
    }

    fn dot_options(&self) -> DotOptions {
        self.config.dot_options()
    }
}
