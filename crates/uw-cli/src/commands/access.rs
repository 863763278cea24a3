//! Access command for showing and changing usage access.

use std::io::Write;

use anyhow::Result;
use uw_db::Database;

use crate::AccessAction;

/// Runs the access command, applying `action` first if given.
pub fn run<W: Write>(writer: &mut W, db: &mut Database, action: Option<AccessAction>) -> Result<()> {
    match action {
        Some(AccessAction::Grant) => db.set_usage_access(true)?,
        Some(AccessAction::Revoke) => db.set_usage_access(false)?,
        None => {}
    }

    let state = if db.usage_access()? { "granted" } else { "denied" };
    writeln!(writer, "Usage access: {state}")?;
    Ok(())
}
