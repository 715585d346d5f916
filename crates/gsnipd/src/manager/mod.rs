//! Command executor keeping the snippet file and memory consistent.
//!
//! The manager jointly owns the [`BackingFile`] and the current
//! [`SnippetContainer`]. Mutations are staged on a copy of the container,
//! written to disk, and then reloaded from disk, so the in-memory state after
//! a successful mutation is exactly what the file holds. A failed write
//! leaves the previous container in place.

mod errors;
#[cfg(test)]
mod tests;

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use gsnip_protocol::{Opcode, Reply, Request};
use tracing::{debug, info, warn};

use crate::backing_file::BackingFile;
use crate::container::SnippetContainer;
use crate::parser::{ParseError, SnippetParser};
use crate::snippet::Snippet;

pub use self::errors::ManagerError;

/// Tracing target for manager events.
pub(crate) const MANAGER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::manager");

/// Executes requests against the snippet store.
#[derive(Debug)]
pub struct Manager {
    file: BackingFile,
    container: RwLock<Arc<SnippetContainer>>,
    parser: Mutex<SnippetParser>,
    mutation: Mutex<()>,
}

impl Manager {
    /// Builds a manager from the current content of `file`.
    ///
    /// An empty file yields an empty container.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, contains malformed blocks, or
    /// repeats a snippet name.
    pub fn open(file: BackingFile) -> Result<Self, ManagerError> {
        let mut parser = SnippetParser::new();
        file.reload()?;
        let container = load(&file, &mut parser)?;
        info!(
            target: MANAGER_TARGET,
            path = %file.path(),
            snippets = container.len()?,
            "snippet file loaded"
        );
        Ok(Self {
            file,
            container: RwLock::new(Arc::new(container)),
            parser: Mutex::new(parser),
            mutation: Mutex::new(()),
        })
    }

    /// Backing file owned by this manager.
    #[must_use]
    pub const fn file(&self) -> &BackingFile {
        &self.file
    }

    /// Executes a decoded request and always produces a reply.
    ///
    /// Failures carry their diagnostic in the reply body; the wire encoding
    /// replaces it with the error marker.
    #[must_use]
    pub fn execute(&self, request: &Request) -> Reply {
        let operation = request.operation();
        match self.run(request) {
            Ok(body) => {
                debug!(target: MANAGER_TARGET, %operation, "request executed");
                Reply::success(body)
            }
            Err(error) => {
                warn!(target: MANAGER_TARGET, %operation, %error, "request failed");
                Reply::failure(error.to_string())
            }
        }
    }

    /// Rereads the whole file and swaps in a freshly parsed container.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be reread or parsed. The previous
    /// container stays in place in that case.
    pub fn reload(&self) -> Result<(), ManagerError> {
        let _mutation = self.lock_mutation()?;
        self.reload_locked()
    }

    /// The container currently being served.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Poisoned`] if the container lock is poisoned.
    pub fn snapshot(&self) -> Result<Arc<SnippetContainer>, ManagerError> {
        self.container
            .read()
            .map(|current| Arc::clone(&current))
            .map_err(|_| ManagerError::Poisoned { what: "container" })
    }

    /// Every snippet currently served, sorted by name.
    ///
    /// # Errors
    ///
    /// Fails if a lock is poisoned.
    pub fn list_all(&self) -> Result<Vec<Snippet>, ManagerError> {
        Ok(self.snapshot()?.list_all()?)
    }

    fn run(&self, request: &Request) -> Result<Vec<u8>, ManagerError> {
        match request.operation() {
            Opcode::List => self.list(),
            Opcode::Find => self.find(request.body_text()?),
            Opcode::Insert => self.insert(request.body_text()?).map(|()| Vec::new()),
            Opcode::Delete => self.delete(request.body_text()?).map(|()| Vec::new()),
            Opcode::Reload => self.reload().map(|()| Vec::new()),
            opcode @ Opcode::Undefined => Err(ManagerError::Unsupported { opcode }),
        }
    }

    fn list(&self) -> Result<Vec<u8>, ManagerError> {
        let mut body = String::new();
        for line in self.snapshot()?.list()? {
            body.push_str(&line);
            body.push('\n');
        }
        Ok(body.into_bytes())
    }

    fn find(&self, name: &str) -> Result<Vec<u8>, ManagerError> {
        let snippet = self.snapshot()?.find(name.trim())?;
        Ok(snippet.body.into_bytes())
    }

    fn insert(&self, text: &str) -> Result<(), ManagerError> {
        let _mutation = self.lock_mutation()?;
        let batch = match self.lock_parser()?.parse(text) {
            Ok(batch) => batch,
            Err(ParseError::Empty) => return Err(ManagerError::EmptyInsert),
            Err(error) => return Err(error.into()),
        };
        let names: Vec<String> = batch.iter().map(|snippet| snippet.name.clone()).collect();
        let staged = self.snapshot()?.try_clone()?;
        staged.insert_all(batch)?;
        self.commit(&staged)?;
        info!(target: MANAGER_TARGET, ?names, "snippets inserted");
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), ManagerError> {
        let name = name.trim();
        let _mutation = self.lock_mutation()?;
        let staged = self.snapshot()?.try_clone()?;
        if !staged.delete(name)? {
            debug!(target: MANAGER_TARGET, name, "delete of absent snippet");
        }
        self.commit(&staged)?;
        info!(target: MANAGER_TARGET, name, "snippet deleted");
        Ok(())
    }

    /// Writes the staged container to disk and reloads from it.
    fn commit(&self, staged: &SnippetContainer) -> Result<(), ManagerError> {
        let text: String = staged.list_all()?.iter().map(Snippet::repr).collect();
        self.file.rewrite(text.as_bytes()).inspect_err(|error| {
            warn!(
                target: MANAGER_TARGET,
                %error,
                "rewrite failed; keeping previous snippets in memory"
            );
        })?;
        self.reload_locked()
    }

    fn reload_locked(&self) -> Result<(), ManagerError> {
        self.file.reload()?;
        let fresh = {
            let mut parser = self.lock_parser()?;
            load(&self.file, &mut parser)?
        };
        let count = fresh.len()?;
        let mut current = self
            .container
            .write()
            .map_err(|_| ManagerError::Poisoned { what: "container" })?;
        *current = Arc::new(fresh);
        debug!(target: MANAGER_TARGET, snippets = count, "container reloaded");
        Ok(())
    }

    fn lock_mutation(&self) -> Result<MutexGuard<'_, ()>, ManagerError> {
        self.mutation
            .lock()
            .map_err(|_| ManagerError::Poisoned { what: "mutation" })
    }

    fn lock_parser(&self) -> Result<MutexGuard<'_, SnippetParser>, ManagerError> {
        self.parser
            .lock()
            .map_err(|_| ManagerError::Poisoned { what: "parser" })
    }
}

/// Parses the file from its current position into a container.
fn load(file: &BackingFile, parser: &mut SnippetParser) -> Result<SnippetContainer, ManagerError> {
    let text = file.read_to_string()?;
    match parser.parse(&text) {
        Ok(snippets) => Ok(SnippetContainer::from_snippets(snippets)?),
        Err(ParseError::Empty) => Ok(SnippetContainer::new()),
        Err(error) => Err(error.into()),
    }
}
