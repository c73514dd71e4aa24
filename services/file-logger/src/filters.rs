//! Header and body predicates used to select which events land in which
//! local log files. A missing regex means the corresponding predicate is
//! always true; `nodename` with a configured regex is false when the event
//! has no `nodename` at all.

use regex::Regex;

use inn_wire::LogHeader;

#[derive(Default)]
pub struct HeaderFilters {
    pub hostname: Option<Regex>,
    pub nodename: Option<Regex>,
    pub log_path: Option<Regex>,
}

impl HeaderFilters {
    pub fn matches(&self, header: &LogHeader) -> bool {
        let hostname_ok = self
            .hostname
            .as_ref()
            .is_none_or(|re| re.is_match(&header.hostname));
        let nodename_ok = match &self.nodename {
            None => true,
            Some(re) => header
                .nodename
                .as_deref()
                .is_some_and(|n| re.is_match(n)),
        };
        let log_path_ok = self
            .log_path
            .as_ref()
            .is_none_or(|re| re.is_match(&header.log_path));
        hostname_ok && nodename_ok && log_path_ok
    }
}

pub fn body_matches(filter: Option<&Regex>, body: &[u8]) -> bool {
    match filter {
        None => true,
        Some(re) => match std::str::from_utf8(body) {
            Ok(s) => re.is_match(s),
            Err(_) => false,
        },
    }
}
