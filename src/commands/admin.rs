use std::fmt;

use serde::Serialize;

use super::{emit, Context};
use crate::admin::table::{TablePage, EMPTY_MESSAGE};
use crate::admin::{AdminSession, Credentials, EditForm, VersionMarker};
use crate::cli::{AdminCommand, EditArgs};
use crate::error::{GuideError, Result};
use crate::storage::KeyValueStore;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginStatus {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl LoginStatus {
    fn of(credentials: Option<&Credentials>) -> Self {
        Self {
            logged_in: credentials.is_some(),
            owner: credentials.map(|c| c.owner.clone()),
            repo: credentials.map(|c| c.repo.clone()),
            branch: credentials.map(|c| c.branch.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileView {
    pub path: String,
    pub version: VersionMarker,
    pub items: usize,
    pub table: Option<TablePage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOutcome {
    pub action: &'static str,
    pub index: usize,
    /// New version when the file was written back.
    pub published: Option<VersionMarker>,
    pub file: FileView,
}

/// Splits `FIELD=VALUE` at the first `=`.
pub fn parse_assignment(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => Err(GuideError::Validation(format!(
            "expected FIELD=VALUE, got '{raw}'"
        ))),
    }
}

fn fill(form: &mut EditForm, assignments: &[String]) -> Result<()> {
    for raw in assignments {
        let (name, value) = parse_assignment(raw)?;
        form.set(name, value)?;
    }
    Ok(())
}

/// Logs in with the saved credentials and opens `path`.
pub async fn open<S: KeyValueStore>(
    store: S,
    api_base: &str,
    path: &str,
) -> Result<AdminSession<S>> {
    let mut session = AdminSession::new(store, api_base);
    let credentials = session.saved_credentials().ok_or_else(|| {
        GuideError::InvalidState("not logged in; run `heartopia admin login` first".into())
    })?;
    session.login(credentials).await?;
    session.load_file(path).await?;
    Ok(session)
}

fn file_view<S: KeyValueStore>(session: &mut AdminSession<S>) -> Result<FileView> {
    let table = session.table_page()?;
    let file = session
        .file()
        .ok_or_else(|| GuideError::InvalidState("no file is open for editing".into()))?;
    Ok(FileView {
        path: file.doc.path().to_string(),
        version: file.version.clone(),
        items: file.doc.len(),
        table,
    })
}

/// Resolves a row argument: a file position, or a row on `page` when given.
/// A page past the end is an error, never the last page.
fn resolve_index<S: KeyValueStore>(
    session: &mut AdminSession<S>,
    index: usize,
    page: Option<usize>,
) -> Result<usize> {
    match page {
        Some(page) => {
            session.select_page(page)?;
            session.row_index(index)
        }
        None => Ok(index),
    }
}

async fn finish<S: KeyValueStore>(
    session: &mut AdminSession<S>,
    action: &'static str,
    index: usize,
    publish: bool,
) -> Result<EditOutcome> {
    let published = if publish {
        Some(session.publish().await?)
    } else {
        None
    };
    Ok(EditOutcome {
        action,
        index,
        published,
        file: file_view(session)?,
    })
}

pub async fn add<S: KeyValueStore>(
    session: &mut AdminSession<S>,
    fields: &[String],
    publish: bool,
) -> Result<EditOutcome> {
    let mut form = session.new_form()?;
    fill(&mut form, fields)?;
    let id = session.save_form(&form)?;
    let index = session
        .document()
        .and_then(|doc| doc.index_of(id))
        .unwrap_or_default();
    session.go_to_page(usize::MAX)?;
    finish(session, "added", index, publish).await
}

pub async fn edit<S: KeyValueStore>(
    session: &mut AdminSession<S>,
    index: usize,
    page: Option<usize>,
    fields: &[String],
    publish: bool,
) -> Result<EditOutcome> {
    let index = resolve_index(session, index, page)?;
    let mut form = session.edit_form(index)?;
    fill(&mut form, fields)?;
    session.save_form(&form)?;
    finish(session, "updated", index, publish).await
}

pub async fn delete<S: KeyValueStore>(
    session: &mut AdminSession<S>,
    index: usize,
    page: Option<usize>,
    publish: bool,
) -> Result<EditOutcome> {
    let index = resolve_index(session, index, page)?;
    session.delete_at(index)?;
    finish(session, "deleted", index, publish).await
}

pub async fn run(ctx: &Context, cmd: AdminCommand) -> Result<()> {
    let api_base = ctx.settings.api_base.as_str();
    match cmd {
        AdminCommand::Login {
            token,
            owner,
            repo,
            branch,
        } => {
            let branch = branch.unwrap_or_else(|| ctx.settings.default_branch.clone());
            let credentials = Credentials::new(&token, &owner, &repo, &branch)?;
            let mut session = AdminSession::new(ctx.open_store(), api_base);
            session.login(credentials).await?;
            emit(ctx.json, &LoginStatus::of(session.saved_credentials().as_ref()))
        }
        AdminCommand::Logout => {
            let mut session = AdminSession::new(ctx.open_store(), api_base);
            session.logout()?;
            emit(ctx.json, &LoginStatus::of(None))
        }
        AdminCommand::Status => {
            let store = ctx.open_store();
            emit(ctx.json, &LoginStatus::of(Credentials::load(&store).as_ref()))
        }
        AdminCommand::Show { path, page } => {
            let mut session = open(ctx.open_store(), api_base, &path).await?;
            session.go_to_page(page)?;
            emit(ctx.json, &file_view(&mut session)?)
        }
        AdminCommand::Add { target, fields } => {
            let EditArgs { path, publish } = target;
            let mut session = open(ctx.open_store(), api_base, &path).await?;
            emit(ctx.json, &add(&mut session, &fields, publish).await?)
        }
        AdminCommand::Edit {
            target,
            index,
            page,
            fields,
        } => {
            let EditArgs { path, publish } = target;
            let mut session = open(ctx.open_store(), api_base, &path).await?;
            emit(ctx.json, &edit(&mut session, index, page, &fields, publish).await?)
        }
        AdminCommand::Delete {
            target,
            index,
            page,
        } => {
            let EditArgs { path, publish } = target;
            let mut session = open(ctx.open_store(), api_base, &path).await?;
            emit(ctx.json, &delete(&mut session, index, page, publish).await?)
        }
    }
}

impl fmt::Display for LoginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.owner, &self.repo, &self.branch) {
            (Some(owner), Some(repo), Some(branch)) => {
                writeln!(f, "Conectado a {owner}/{repo} ({branch})")
            }
            _ => writeln!(f, "Sin sesión"),
        }
    }
}

impl fmt::Display for FileView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} @ {}", self.path, self.version)?;
        match &self.table {
            Some(table) => write!(f, "{table}"),
            None => writeln!(f, "{EMPTY_MESSAGE}"),
        }
    }
}

impl fmt::Display for EditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} item {}", self.action, self.index)?;
        write!(f, "{}", self.file)?;
        match &self.published {
            Some(version) => writeln!(f, "Publicado: {version}"),
            None => writeln!(f, "Sin publicar (usa --publish para guardar en el repositorio)"),
        }
    }
}
