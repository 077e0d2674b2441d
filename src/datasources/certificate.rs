//! The `ionoscloud_certificate` data source.

use serde_json::Value;

use crate::api::{cert, IonosClient};
use crate::error::ProviderError;
use crate::resolve::{exactly_one, not_found_by_id, Selector};
use crate::resources::certificate::certificate_to_state;
use crate::schema::{Attribute, Kind, Schema};

use super::{selector_schema, DataSourceHandler};

pub struct CertificateDataSource;

#[async_trait::async_trait]
impl DataSourceHandler for CertificateDataSource {
    fn type_name(&self) -> &'static str {
        "ionoscloud_certificate"
    }

    fn schema(&self) -> Schema {
        selector_schema()
            .attr("certificate", Attribute::computed(Kind::String))
            .attr("certificate_chain", Attribute::computed(Kind::String))
    }

    async fn read(&self, api: &IonosClient, config: Value) -> Result<Value, ProviderError> {
        let selector = Selector::from_config("certificate", &config)?;

        let certificate = match selector.id() {
            Some(id) => match cert::get_certificate(api, id).await {
                Ok(certificate) => certificate,
                Err(e) if e.is_not_found() => return Err(not_found_by_id("certificate", id)),
                Err(e) => return Err(e.into()),
            },
            None => {
                let listing = cert::list_certificates(api).await?;
                exactly_one("certificate", &selector, listing.items, |certificate| {
                    certificate.properties.as_ref().and_then(|p| p.name.as_deref())
                })?
            }
        };

        Ok(certificate_to_state(&certificate, &Value::Null))
    }
}
