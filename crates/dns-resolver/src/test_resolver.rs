use crate::{normalize_name, DnsError, Resolver};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

/// An in-memory [Resolver] for tests.
///
/// Names that have not been populated produce [DnsError::NotFound];
/// names registered through [TestResolver::with_failure] produce
/// [DnsError::ResolveFailed] for every query type.
#[derive(Debug, Default, Clone)]
pub struct TestResolver {
    txt: BTreeMap<String, Vec<String>>,
    hosts: BTreeMap<String, Vec<IpAddr>>,
    ptr: BTreeMap<String, Vec<String>>,
    failing: BTreeSet<String>,
}

impl TestResolver {
    pub fn with_txt(mut self, name: &str, value: impl Into<String>) -> Self {
        self.txt
            .entry(normalize_name(name))
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_host(mut self, name: &str, addrs: &[IpAddr]) -> Self {
        self.hosts
            .entry(normalize_name(name))
            .or_default()
            .extend_from_slice(addrs);
        self
    }

    pub fn with_ptr(mut self, addr: &str, names: &[&str]) -> Self {
        self.ptr
            .entry(addr.to_ascii_lowercase())
            .or_default()
            .extend(names.iter().map(|name| normalize_name(name)));
        self
    }

    pub fn with_failure(mut self, name: &str) -> Self {
        self.failing.insert(normalize_name(name));
        self
    }

    fn get<T: Clone>(
        &self,
        map: &BTreeMap<String, Vec<T>>,
        name: &str,
    ) -> Result<Vec<T>, DnsError> {
        let key = normalize_name(name);
        if self.failing.contains(&key) {
            return Err(DnsError::ResolveFailed(format!(
                "failed to query DNS for {name}: simulated failure"
            )));
        }
        map.get(&key)
            .cloned()
            .ok_or_else(|| DnsError::NotFound(name.to_string()))
    }
}

#[async_trait]
impl Resolver for TestResolver {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        self.get(&self.txt, name)
    }

    async fn lookup_host(&self, name: &str) -> Result<Vec<IpAddr>, DnsError> {
        self.get(&self.hosts, name)
    }

    async fn lookup_addr(&self, addr: &str) -> Result<Vec<String>, DnsError> {
        self.get(&self.ptr, addr)
    }
}
