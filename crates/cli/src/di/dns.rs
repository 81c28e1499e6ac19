use ferrous_split_application::ports::{AnswerCache, HostsResolver, UpstreamClient};
use ferrous_split_application::services::Matcher;
use ferrous_split_application::use_cases::{Dispatcher, HandleDnsQueryUseCase};
use ferrous_split_domain::{Config, DomainList, HostsTable, IpNetworkList, ResourceLoadError};
use ferrous_split_infrastructure::dns::{
    ForwardingUpstreamClient, HostsFileResolver, LruAnswerCache,
};
use ferrous_split_infrastructure::lists;
use std::sync::Arc;
use tracing::{info, info_span, warn};

pub struct DnsServices {
    pub handler_use_case: Arc<HandleDnsQueryUseCase>,
}

impl DnsServices {
    /// Builds the resolution stack for `config`. Missing or unreadable list
    /// files disable the corresponding feature instead of failing.
    pub async fn new(config: &Config) -> Self {
        let matcher = Arc::new(Self::build_matcher(config).await);
        let hosts = Self::build_hosts(config).await;
        let cache = Self::build_cache(config);

        info!(
            primary = config.primary.len(),
            alternative = config.alternative.len(),
            only_primary = config.only_primary,
            domains = matcher.domain_count(),
            networks = matcher.network_count(),
            cache_size = config.cache_size,
            "Initializing DNS dispatcher"
        );

        let client: Arc<dyn UpstreamClient> = Arc::new(ForwardingUpstreamClient::new());
        let nat64_prefix = config
            .redirect_ipv6_record
            .then_some(config.redirect_ipv6_prefix);

        let dispatcher = Dispatcher::builder(
            client,
            config.primary.clone(),
            config.alternative.clone(),
        )
        .matcher(matcher)
        .only_primary(config.only_primary)
        .redirect_ipv6(nat64_prefix)
        .cache(cache)
        .hosts(hosts)
        .span(info_span!("dispatcher", bind = %config.bind_address))
        .build();

        let handler_use_case = Arc::new(
            HandleDnsQueryUseCase::new(Arc::new(dispatcher))
                .with_minimum_ttl(config.minimum_ttl)
                .with_rejected_types(config.reject_qtypes.clone()),
        );

        Self { handler_use_case }
    }

    async fn build_matcher(config: &Config) -> Matcher {
        let domains = match &config.domain_file {
            Some(path) => or_degrade(
                lists::load_domain_list(
                    path,
                    config.domain_base64_decode,
                    &config.domain_cutoff_marker,
                )
                .await,
                "domain list",
            ),
            None => DomainList::default(),
        };

        let networks = match &config.ip_network_file {
            Some(path) => or_degrade(lists::load_ip_network_list(path).await, "IP network list"),
            None => IpNetworkList::default(),
        };

        Matcher::new(&domains, networks)
    }

    async fn build_hosts(config: &Config) -> Option<Arc<dyn HostsResolver>> {
        let path = config.hosts_file.as_ref()?;
        let table: HostsTable = or_degrade(lists::load_hosts(path).await, "hosts file");
        if table.is_empty() {
            return None;
        }
        info!(names = table.len(), "Hosts overrides enabled");
        Some(Arc::new(HostsFileResolver::new(table)))
    }

    fn build_cache(config: &Config) -> Option<Arc<dyn AnswerCache>> {
        let cache = LruAnswerCache::new(config.cache_size)?;
        info!(capacity = config.cache_size, "Answer cache enabled");
        Some(Arc::new(cache))
    }
}

/// Logs a failed load and falls back to the empty value, which disables the
/// feature the file would have configured.
fn or_degrade<T: Default>(result: Result<T, ResourceLoadError>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load {}, continuing without it", what);
        T::default()
    })
}
