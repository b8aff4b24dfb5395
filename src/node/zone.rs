//! Zone registry
//!
//! Each domain owned by this node has a [`DomainRegistry`]: the zone file,
//! the change log, the domain's vector clock, and an index from record name
//! to its 1-based line in the zone file.
//!
//! ## Storage
//! - Create appends one line to the zone file.
//! - Update and Delete read the whole file, change one line in memory and
//!   rewrite the file. Delete blanks the line instead of removing it, so line
//!   numbers never shift.
//! - Every mutation appends one entry to the change log and advances this
//!   node's slot of the domain's vector clock.
//! - Lines are handled as raw bytes; only the line being changed is decoded.
//!   A line that is not UTF-8 is reported as corruption.
//!
//! ## Write order
//! Reads and validation come first, then the change log entry, then the zone
//! file write. Clock and index move only after both writes succeed. A failed
//! log append leaves the zone file untouched. A zone write that fails after
//! the append leaves a logged entry that was never applied.
//!
//! ## Concurrency
//! [`ZoneStore`] holds one mutex per domain. Mutations on the same domain are
//! serialised inside the node; different domains proceed in parallel.

use crate::common::{Error, NodeIdentity, NodeSettings, QualifiedName, Result, VectorClock};
use crate::node::changelog::{ChangeEntry, ChangeLog};
use crate::node::lines::{append_line, read_lines, rewrite_lines, ZoneRecord};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

/// Field changed by an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOption {
    Ip,
    Name,
}

impl UpdateOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOption::Ip => "ip",
            UpdateOption::Name => "name",
        }
    }
}

impl FromStr for UpdateOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ip" => Ok(UpdateOption::Ip),
            "name" => Ok(UpdateOption::Name),
            other => Err(Error::InvalidOption(other.to_string())),
        }
    }
}

impl std::fmt::Display for UpdateOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a create: the domain's clock plus the endpoint of the node that
/// now owns the domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    pub clock: VectorClock,
    pub ip: IpAddr,
    pub port: u16,
}

/// Point-in-time copy of a domain's registry state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSnapshot {
    pub domain: String,
    pub zone_path: PathBuf,
    pub log_path: PathBuf,
    pub clock: VectorClock,
    pub name_to_line: BTreeMap<String, usize>,
    pub line_count: usize,
    pub free_lines: Vec<usize>,
}

/// State of one domain owned by this node.
#[derive(Debug)]
pub struct DomainRegistry {
    domain: String,
    zone_path: PathBuf,
    log: ChangeLog,
    clock: VectorClock,
    name_to_line: HashMap<String, usize>,
    /// Lines ever written to the zone file; never shrinks
    line_count: usize,
    /// Tombstoned lines, reused only when the store enables it
    free_lines: BTreeSet<usize>,
}

impl DomainRegistry {
    fn new(domain: &str, zone_path: PathBuf, log_path: PathBuf, replicas: usize) -> Self {
        Self {
            domain: domain.to_string(),
            zone_path,
            log: ChangeLog::new(log_path),
            clock: VectorClock::new(replicas),
            name_to_line: HashMap::new(),
            line_count: 0,
            free_lines: BTreeSet::new(),
        }
    }

    fn fqdn(&self, name: &str) -> String {
        format!("{}.{}", name, self.domain)
    }

    fn create(&mut self, name: &str, ip: &str, slot: usize, reuse_tombstones: bool) -> Result<usize> {
        let fqdn = self.fqdn(name);
        if let Some(previous) = self.name_to_line.get(name) {
            tracing::warn!(
                record = %fqdn,
                previous_line = previous,
                "name already registered, previous line is left orphaned"
            );
        }

        let record = ZoneRecord::new(fqdn.clone(), ip);
        let entry = ChangeEntry::Create {
            fqdn,
            ip: ip.to_string(),
        };

        let line = match self.free_lines.first().copied().filter(|_| reuse_tombstones) {
            Some(line) => {
                let mut lines = self.read_padded()?;
                lines[line - 1] = record.to_line().into_bytes();
                self.log.append(&entry)?;
                rewrite_lines(&self.zone_path, &lines)?;
                self.free_lines.remove(&line);
                line
            }
            None => {
                self.log.append(&entry)?;
                append_line(&self.zone_path, &record.to_line(), self.line_count == 0)?;
                self.line_count += 1;
                self.line_count
            }
        };

        self.clock.tick(slot);
        self.name_to_line.insert(name.to_string(), line);

        Ok(line)
    }

    fn update(&mut self, name: &str, option: UpdateOption, param: &str, slot: usize) -> Result<()> {
        let line = self.line_of(name)?;
        let mut lines = self.read_padded()?;
        let current = &lines[line - 1];
        if current.is_empty() {
            return Err(Error::Corrupted(format!(
                "line {} for {} is blank",
                line,
                self.fqdn(name)
            )));
        }

        let mut record = ZoneRecord::decode(current)?;
        let (new_name, changed) = match option {
            UpdateOption::Ip => {
                record.ip = param.to_string();
                (name.to_string(), param.to_string())
            }
            UpdateOption::Name => {
                record.owner = self.fqdn(param);
                (param.to_string(), record.owner.clone())
            }
        };

        lines[line - 1] = record.to_line().into_bytes();

        self.log.append(&ChangeEntry::Update {
            fqdn: self.fqdn(&new_name),
            value: changed,
        })?;
        rewrite_lines(&self.zone_path, &lines)?;
        self.clock.tick(slot);
        self.name_to_line.remove(name);
        self.name_to_line.insert(new_name, line);

        Ok(())
    }

    fn delete(&mut self, name: &str, slot: usize) -> Result<()> {
        let line = self.line_of(name)?;
        let mut lines = self.read_padded()?;
        if lines[line - 1].is_empty() {
            return Err(Error::Corrupted(format!(
                "line {} for {} is already blank",
                line,
                self.fqdn(name)
            )));
        }

        lines[line - 1].clear();

        self.log.append(&ChangeEntry::Delete {
            fqdn: self.fqdn(name),
        })?;
        rewrite_lines(&self.zone_path, &lines)?;
        self.clock.tick(slot);
        self.name_to_line.remove(name);
        self.free_lines.insert(line);

        Ok(())
    }

    fn line_of(&self, name: &str) -> Result<usize> {
        self.name_to_line.get(name).copied().ok_or_else(|| {
            Error::NotFound(format!("name {} not registered in domain {}", name, self.domain))
        })
    }

    /// Zone file lines, padded with blanks up to `line_count` when the file
    /// ends in tombstones or was truncated underneath us.
    fn read_padded(&self) -> Result<Vec<Vec<u8>>> {
        let mut lines = read_lines(&self.zone_path)?;
        if lines.len() < self.line_count {
            tracing::debug!(
                domain = %self.domain,
                read = lines.len(),
                expected = self.line_count,
                "padding zone lines"
            );
            lines.resize(self.line_count, Vec::new());
        }
        Ok(lines)
    }

    pub fn snapshot(&self) -> DomainSnapshot {
        DomainSnapshot {
            domain: self.domain.clone(),
            zone_path: self.zone_path.clone(),
            log_path: self.log.path().to_path_buf(),
            clock: self.clock.clone(),
            name_to_line: self
                .name_to_line
                .iter()
                .map(|(name, line)| (name.clone(), *line))
                .collect(),
            line_count: self.line_count,
            free_lines: self.free_lines.iter().copied().collect(),
        }
    }
}

/// Every domain owned by this node.
pub struct ZoneStore {
    identity: NodeIdentity,
    slot: usize,
    replicas: usize,
    zones_dir: PathBuf,
    logs_dir: PathBuf,
    reuse_tombstones: bool,
    domains: Mutex<HashMap<String, Arc<Mutex<DomainRegistry>>>>,
}

impl ZoneStore {
    /// Open the store for the node adopting `identity` at vector clock `slot`
    /// of `replicas`. Creates the zone and log directories.
    pub fn open(
        identity: NodeIdentity,
        slot: usize,
        replicas: usize,
        settings: &NodeSettings,
    ) -> Result<Self> {
        if slot >= replicas {
            return Err(Error::InvalidConfig(format!(
                "clock slot {} out of range for {} replicas",
                slot, replicas
            )));
        }

        let zones_dir = settings.zones_dir();
        let logs_dir = settings.logs_dir();
        std::fs::create_dir_all(&zones_dir)?;
        std::fs::create_dir_all(&logs_dir)?;

        Ok(Self {
            identity,
            slot,
            replicas,
            zones_dir,
            logs_dir,
            reuse_tombstones: settings.reuse_tombstones,
            domains: Mutex::new(HashMap::new()),
        })
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn zone_path(&self, domain: &str) -> PathBuf {
        self.zones_dir
            .join(format!("{}_{}.zf", self.identity.id, domain))
    }

    pub fn log_path(&self, domain: &str) -> PathBuf {
        self.logs_dir
            .join(format!("{}_{}.log", self.identity.id, domain))
    }

    /// Register `<name>.<domain> IN A <ip>`, initialising the domain on first use.
    pub fn create(&self, qualified: &QualifiedName, ip: &str) -> Result<CreateOutcome> {
        validate_address(ip)?;

        let registry = self.registry_or_init(qualified.domain())?;
        let mut registry = lock(&registry)?;
        let line = registry.create(qualified.name(), ip, self.slot, self.reuse_tombstones)?;

        tracing::info!(
            record = %qualified,
            ip,
            line,
            clock = %registry.clock,
            "record created"
        );

        Ok(CreateOutcome {
            clock: registry.clock.clone(),
            ip: self.identity.ip,
            port: self.identity.port,
        })
    }

    pub fn update(
        &self,
        qualified: &QualifiedName,
        option: UpdateOption,
        param: &str,
    ) -> Result<VectorClock> {
        match option {
            UpdateOption::Ip => validate_address(param)?,
            UpdateOption::Name => validate_label(param)?,
        }

        let registry = self.registry(qualified.domain())?;
        let mut registry = lock(&registry)?;
        registry.update(qualified.name(), option, param, self.slot)?;

        tracing::info!(
            record = %qualified,
            %option,
            param,
            clock = %registry.clock,
            "record updated"
        );

        Ok(registry.clock.clone())
    }

    pub fn delete(&self, qualified: &QualifiedName) -> Result<VectorClock> {
        let registry = self.registry(qualified.domain())?;
        let mut registry = lock(&registry)?;
        registry.delete(qualified.name(), self.slot)?;

        tracing::info!(record = %qualified, clock = %registry.clock, "record deleted");

        Ok(registry.clock.clone())
    }

    pub fn snapshot(&self, domain: &str) -> Option<DomainSnapshot> {
        let registry = self.registry(domain).ok()?;
        let registry = lock(&registry).ok()?;
        Some(registry.snapshot())
    }

    /// Domains owned by this node, sorted
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = match self.domains.lock() {
            Ok(map) => map.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        domains.sort();
        domains
    }

    fn registry(&self, domain: &str) -> Result<Arc<Mutex<DomainRegistry>>> {
        let map = lock(&self.domains)?;
        map.get(domain)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("domain {} not owned by this node", domain)))
    }

    /// Look up `domain`, initialising it when unseen. Leftover files for a
    /// domain with no in-memory state are a conflict; nothing is recovered.
    fn registry_or_init(&self, domain: &str) -> Result<Arc<Mutex<DomainRegistry>>> {
        let mut map = lock(&self.domains)?;
        if let Some(registry) = map.get(domain) {
            return Ok(registry.clone());
        }

        let zone_path = self.zone_path(domain);
        let log_path = self.log_path(domain);
        for path in [&zone_path, &log_path] {
            if exists(path)? {
                tracing::error!(
                    domain,
                    path = %path.display(),
                    "found files for a domain with no in-memory registry"
                );
                return Err(Error::StateConflict(format!(
                    "{} exists but domain {} has no in-memory registry",
                    path.display(),
                    domain
                )));
            }
        }

        let registry = Arc::new(Mutex::new(DomainRegistry::new(
            domain,
            zone_path,
            log_path,
            self.replicas,
        )));
        map.insert(domain.to_string(), registry.clone());
        tracing::info!(domain, "initialised zone registry");

        Ok(registry)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| Error::Internal("zone registry lock poisoned".into()))
}

fn exists(path: &Path) -> Result<bool> {
    Ok(path.try_exists()?)
}

fn validate_address(ip: &str) -> Result<()> {
    ip.parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| Error::InvalidAddress(ip.to_string()))
}

fn validate_label(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('.') || name.contains(char::is_whitespace) {
        return Err(Error::InvalidName(format!("'{}' is not a valid record name", name)));
    }
    Ok(())
}
