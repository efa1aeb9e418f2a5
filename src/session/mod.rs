//! Interactive operator session.
//!
//! The session owns everything a command needs: the inventory, the
//! credential store and the rotation engine. Commands run one at a time to
//! completion; only I/O errors on the console end the loop early.

pub mod command;

pub use command::{Command, Selector, USAGE};

use crate::core::{AdminError, Result, ShardGroup};
use crate::reconcile::reconcile;
use crate::result::Listing;
use crate::rotation::{InstanceConnector, Rotator};
use crate::storage::CredentialStore;
use crate::topology::Topology;
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

pub const PROMPT: &str = ">> ";

/// Whether the session keeps reading commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Session<C> {
    topology: Topology,
    store: CredentialStore,
    rotator: Rotator<C>,
}

impl<C: InstanceConnector> Session<C> {
    /// Reconcile the store against the topology and return a ready session
    pub fn start(topology: Topology, mut store: CredentialStore, rotator: Rotator<C>) -> Self {
        reconcile(topology.instances(), &mut store);
        Self {
            topology,
            store,
            rotator,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn rotator(&self) -> &Rotator<C> {
        &self.rotator
    }

    /// Read commands from `input` until `exit` or end of input
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(out, "{}", USAGE)?;
        let mut lines = input.lines();
        loop {
            write!(out, "{}", PROMPT)?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                writeln!(out)?;
                return Ok(());
            };
            if self.handle_line(&line, out).await? == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// Parse and execute one line, turning command failures into a
    /// one-line diagnostic
    pub async fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        // Never log the whole line, it may carry a password.
        let word = line.split_whitespace().next().unwrap_or("");
        let result = match Command::parse(line) {
            Ok(Some(command)) => {
                debug!(command = word, "executing");
                self.execute(command, out).await
            }
            Ok(None) => Ok(Flow::Continue),
            Err(e) => Err(e),
        };

        match result {
            Ok(flow) => Ok(flow),
            Err(AdminError::Io(e)) => Err(e),
            Err(e) => {
                warn!(command = word, phase = e.phase(), error = %e, "command failed");
                writeln!(out, "error: {}", e)?;
                Ok(Flow::Continue)
            }
        }
    }

    pub async fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow> {
        match command {
            Command::Help => writeln!(out, "{}", USAGE)?,
            Command::Exit => {
                writeln!(out, "Bye!")?;
                return Ok(Flow::Exit);
            }
            Command::List(None) => self.list_groups(out)?,
            Command::List(Some(Selector::All)) => {
                for group in self.topology.groups() {
                    self.list_members(group, out)?;
                    writeln!(out)?;
                }
            }
            Command::List(Some(Selector::Id(id))) => {
                let group = self
                    .topology
                    .group(id)
                    .ok_or_else(|| AdminError::invalid_argument(format!("group id out of range: {}", id)))?;
                self.list_members(group, out)?;
            }
            Command::Set { target, password } => self.set(target, &password, out).await?,
            Command::Passwd => self.list_passwords(out)?,
        }
        Ok(Flow::Continue)
    }

    async fn set<W: Write>(&mut self, target: Selector, password: &str, out: &mut W) -> Result<()> {
        match target {
            Selector::Id(id) => {
                let instance = self
                    .topology
                    .instance(id)
                    .ok_or_else(|| AdminError::invalid_argument(format!("instance id out of range: {}", id)))?;
                self.rotator
                    .rotate_instance(&mut self.store, instance, password)
                    .await?;
                writeln!(
                    out,
                    "{}: password set{}",
                    instance.endpoint(),
                    unsaved_note(self.store.is_synced())
                )?;
            }
            Selector::All => {
                let report = self
                    .rotator
                    .rotate_all(&mut self.store, self.topology.instances(), password)
                    .await?;
                for outcome in report.outcomes() {
                    match &outcome.result {
                        Ok(()) => writeln!(
                            out,
                            "#{:<4}{}: password set{}",
                            outcome.instance_id,
                            outcome.endpoint,
                            unsaved_note(outcome.persisted)
                        )?,
                        Err(e) => writeln!(out, "#{:<4}{}", outcome.instance_id, e)?,
                    }
                }
                writeln!(out, "{} succeeded, {} failed", report.succeeded(), report.failed())?;
            }
        }
        Ok(())
    }

    fn list_groups<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut listing = Listing::new(["ID", "PROXY_GROUP_NAME", "LISTEN"]);
        for group in self.topology.groups() {
            listing.push_row([
                group.id().to_string(),
                group.name().to_string(),
                group.listen().unwrap_or("").to_string(),
            ]);
        }
        listing.render(out)?;
        Ok(())
    }

    fn list_members<W: Write>(&self, group: &ShardGroup, out: &mut W) -> Result<()> {
        writeln!(out, "#{:<4}{}", group.id(), group.name())?;
        let mut listing = Listing::new(["ID", "REDIS INSTANCE"]);
        for instance in self.topology.instances_in(group.name()) {
            listing.push_row([instance.id().to_string(), instance.endpoint().to_string()]);
        }
        listing.render(out)?;
        Ok(())
    }

    fn list_passwords<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut listing = Listing::new(["ID", "INSTANCE", "PASSWORD"]);
        for instance in self.topology.instances() {
            listing.push_row([
                instance.id().to_string(),
                instance.endpoint().to_string(),
                self.store.get(instance.endpoint()).to_string(),
            ]);
        }
        listing.render(out)?;
        Ok(())
    }
}

fn unsaved_note(persisted: bool) -> &'static str {
    if persisted { "" } else { " (store file not updated)" }
}
