//! Editor session: login, load one file, edit it in memory, publish it back.

use serde::Serialize;

use super::document::{Document, ItemId, Record};
use super::form::EditForm;
use super::github::{ContentHost, Credentials, VersionMarker};
use super::table::{AdminTable, TablePage};
use crate::error::{FailureClass, GuideError, Result};
use crate::storage::KeyValueStore;

/// Where the session is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "phase")]
pub enum Phase {
    Anonymous,
    Authenticating,
    Authenticated,
    Editing { dirty: bool },
    Publishing,
}

/// The file currently being edited.
#[derive(Debug)]
pub struct OpenFile {
    pub doc: Document,
    pub version: VersionMarker,
    pub dirty: bool,
    pub table: AdminTable,
}

enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated(ContentHost),
    Editing(ContentHost, OpenFile),
    Publishing(ContentHost, OpenFile),
}

pub struct AdminSession<S: KeyValueStore> {
    store: S,
    api_base: String,
    state: SessionState,
}

impl<S: KeyValueStore> AdminSession<S> {
    pub fn new(store: S, api_base: &str) -> Self {
        Self {
            store,
            api_base: api_base.to_string(),
            state: SessionState::Anonymous,
        }
    }

    pub fn phase(&self) -> Phase {
        match &self.state {
            SessionState::Anonymous => Phase::Anonymous,
            SessionState::Authenticating => Phase::Authenticating,
            SessionState::Authenticated(_) => Phase::Authenticated,
            SessionState::Editing(_, file) => Phase::Editing { dirty: file.dirty },
            SessionState::Publishing(..) => Phase::Publishing,
        }
    }

    /// Credentials kept from an earlier login, for prefilling.
    pub fn saved_credentials(&self) -> Option<Credentials> {
        Credentials::load(&self.store)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn file(&self) -> Option<&OpenFile> {
        match &self.state {
            SessionState::Editing(_, file) | SessionState::Publishing(_, file) => Some(file),
            _ => None,
        }
    }

    pub fn version(&self) -> Option<&VersionMarker> {
        self.file().map(|f| &f.version)
    }

    fn take_state(&mut self) -> SessionState {
        std::mem::replace(&mut self.state, SessionState::Anonymous)
    }

    /// Checks the credentials against the host. Only a successful probe
    /// authenticates the session and saves the credentials.
    pub async fn login(&mut self, credentials: Credentials) -> Result<()> {
        self.state = SessionState::Authenticating;
        let host = ContentHost::new(&self.api_base, credentials);
        match host.verify().await {
            Ok(()) => {
                if let Err(e) = host.credentials().save(&mut self.store) {
                    tracing::warn!("could not save credentials: {e}");
                    if let Err(clear) = Credentials::clear(&mut self.store) {
                        tracing::warn!("could not clear partly saved credentials: {clear}");
                    }
                    self.state = SessionState::Anonymous;
                    return Err(e);
                }
                tracing::info!(
                    "logged in to {}/{} on {}",
                    host.credentials().owner,
                    host.credentials().repo,
                    host.credentials().branch
                );
                self.state = SessionState::Authenticated(host);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("login failed: {e}");
                self.state = SessionState::Anonymous;
                Err(e)
            }
        }
    }

    /// Forgets the saved credentials and any open file.
    pub fn logout(&mut self) -> Result<()> {
        Credentials::clear(&mut self.store)?;
        self.state = SessionState::Anonymous;
        Ok(())
    }

    /// Fetches and parses `path`, replacing whatever file was open.
    ///
    /// A file that is not a JSON array of objects is never partially opened. If
    /// the request itself fails the previously open file stays as it was.
    pub async fn load_file(&mut self, path: &str) -> Result<()> {
        let (host, previous) = match self.take_state() {
            SessionState::Authenticated(host) => (host, None),
            SessionState::Editing(host, file) | SessionState::Publishing(host, file) => {
                if file.dirty {
                    tracing::warn!("discarding unpublished edits to {}", file.doc.path());
                }
                (host, Some(file))
            }
            other => {
                self.state = other;
                return Err(GuideError::InvalidState("log in before loading a file".into()));
            }
        };

        let loaded = match host.get_file(path).await {
            Ok(remote) => Document::parse(path, &remote.text).map(|doc| (doc, remote.version)),
            Err(e) => Err(e),
        };

        match loaded {
            Ok((doc, version)) => {
                tracing::info!("loaded {path} ({} items) at {version}", doc.len());
                self.state = SessionState::Editing(
                    host,
                    OpenFile {
                        doc,
                        version,
                        dirty: false,
                        table: AdminTable::new(),
                    },
                );
                Ok(())
            }
            Err(e) => {
                self.state = match (e.class(), previous) {
                    (FailureClass::Transient, Some(file)) => SessionState::Editing(host, file),
                    _ => SessionState::Authenticated(host),
                };
                if e.class() == FailureClass::Fatal {
                    tracing::error!("{path} could not be opened: {e}");
                } else {
                    tracing::warn!("loading {path} failed: {e}");
                }
                Err(e)
            }
        }
    }

    fn editing(&mut self) -> Result<&mut OpenFile> {
        match &mut self.state {
            SessionState::Editing(_, file) | SessionState::Publishing(_, file) => Ok(file),
            _ => Err(GuideError::InvalidState("no file is open for editing".into())),
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.file().map(|f| &f.doc)
    }

    /// Blank form for a new item.
    pub fn new_form(&mut self) -> Result<EditForm> {
        Ok(EditForm::for_new(&self.editing()?.doc))
    }

    /// Form for the item at a file position.
    pub fn edit_form(&mut self, index: usize) -> Result<EditForm> {
        let doc = &self.editing()?.doc;
        EditForm::for_item(doc, doc.id_at(index)?)
    }

    /// Stores the form's item in memory. Validation failures leave the file untouched.
    pub fn save_form(&mut self, form: &EditForm) -> Result<ItemId> {
        let record = form.to_record()?;
        match form.target {
            Some(id) => self.update(id, record).map(|()| id),
            None => self.create(record),
        }
    }

    pub fn create(&mut self, record: Record) -> Result<ItemId> {
        let file = self.editing()?;
        let id = file.doc.create(record);
        file.dirty = true;
        Ok(id)
    }

    pub fn update(&mut self, id: ItemId, record: Record) -> Result<()> {
        let file = self.editing()?;
        file.doc.update(id, record)?;
        file.dirty = true;
        Ok(())
    }

    pub fn delete(&mut self, id: ItemId) -> Result<Record> {
        let file = self.editing()?;
        let removed = file.doc.delete(id)?;
        file.dirty = true;
        file.table.clamp(file.doc.len());
        Ok(removed)
    }

    pub fn update_at(&mut self, index: usize, record: Record) -> Result<()> {
        let id = self.editing()?.doc.id_at(index)?;
        self.update(id, record)
    }

    pub fn delete_at(&mut self, index: usize) -> Result<Record> {
        let id = self.editing()?.doc.id_at(index)?;
        self.delete(id)
    }

    pub fn table_page(&mut self) -> Result<Option<TablePage>> {
        let file = self.editing()?;
        Ok(file.table.render(&file.doc))
    }

    pub fn change_page(&mut self, delta: isize) -> Result<()> {
        let file = self.editing()?;
        file.table.change_page(delta, file.doc.len());
        Ok(())
    }

    pub fn go_to_page(&mut self, page: usize) -> Result<()> {
        let file = self.editing()?;
        file.table.go_to(page, file.doc.len());
        Ok(())
    }

    /// Like [`go_to_page`](Self::go_to_page) but refuses pages the file does not have.
    pub fn select_page(&mut self, page: usize) -> Result<()> {
        let file = self.editing()?;
        file.table.select(page, file.doc.len())
    }

    /// File position of a row on the current table page.
    pub fn row_index(&mut self, local: usize) -> Result<usize> {
        let file = self.editing()?;
        file.table.absolute_index(local, file.doc.len())
    }

    /// Writes the whole in-memory array as one new revision.
    ///
    /// The host refuses the write if the file changed since it was loaded;
    /// that is reported as [`GuideError::Conflict`] and the edits stay pending.
    pub async fn publish(&mut self) -> Result<VersionMarker> {
        let (host, file) = match self.take_state() {
            SessionState::Editing(host, file) | SessionState::Publishing(host, file)
                if file.dirty =>
            {
                (host, file)
            }
            other => {
                let reason = if matches!(other, SessionState::Editing(..)) {
                    "there are no changes to publish"
                } else {
                    "no file is open for editing"
                };
                self.state = other;
                return Err(GuideError::InvalidState(reason.into()));
            }
        };

        let text = match file.doc.to_json() {
            Ok(text) => text,
            Err(e) => {
                self.state = SessionState::Editing(host, file);
                return Err(e);
            }
        };
        let path = file.doc.path().to_string();
        let message = format!("CMS Update: {path}");
        let base = file.version.clone();
        self.state = SessionState::Publishing(host, file);

        let result = match &self.state {
            SessionState::Publishing(host, _) => host.put_file(&path, &text, &base, &message).await,
            _ => Err(GuideError::InvalidState("publish was interrupted".into())),
        };

        let (host, mut file) = match self.take_state() {
            SessionState::Publishing(host, file) => (host, file),
            other => {
                self.state = other;
                return Err(GuideError::InvalidState("publish was interrupted".into()));
            }
        };
        match result {
            Ok(version) => {
                tracing::info!("published {path} at {version}");
                file.version = version.clone();
                file.dirty = false;
                self.state = SessionState::Editing(host, file);
                Ok(version)
            }
            Err(e) => {
                tracing::warn!("publishing {path} failed: {e}");
                self.state = SessionState::Editing(host, file);
                Err(e)
            }
        }
    }
}
