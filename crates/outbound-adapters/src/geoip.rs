//! Location lookup against a freegeoip-compatible JSON service
//! (`GET {base}/{ip}` returning `city`, `region_name`, `country_name`, `country_code`).

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use domains::{DomainError, Location, LocationLookup, Result};
use reqwest::Client;
use url::Url;

pub struct FreeGeoIpLookup {
    client: Client,
    base_url: Url,
}

impl FreeGeoIpLookup {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DomainError::validation(format!("invalid geoip base url: {e}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::infrastructure(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    fn lookup_url(&self, ip: &str) -> Result<Url> {
        // Only ever interpolate a real address into the path.
        let ip: IpAddr = ip
            .parse()
            .map_err(|_| DomainError::infrastructure(format!("{ip:?} is not an IP address")))?;
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{ip}"))
            .map_err(|e| DomainError::infrastructure(format!("failed to build lookup url: {e}")))
    }
}

#[async_trait]
impl LocationLookup for FreeGeoIpLookup {
    async fn locate(&self, ip: &str) -> Result<Location> {
        let url = self.lookup_url(ip)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DomainError::infrastructure(format!("geoip request failed: {e}")))?;

        response
            .json::<Location>()
            .await
            .map_err(|e| DomainError::infrastructure(format!("geoip response unreadable: {e}")))
    }
}

/// Stands in when lookups are switched off; always resolves to "nowhere".
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLookup;

#[async_trait]
impl LocationLookup for DisabledLookup {
    async fn locate(&self, _ip: &str) -> Result<Location> {
        Ok(Location::default())
    }
}
