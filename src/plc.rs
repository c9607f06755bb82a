//! Typed single-tag read/write facade.

use tracing::debug;

use crate::cip;
use crate::codec::{CipType, PlcValue};
use crate::config::ClientConfig;
use crate::error::{EipError, Result};
use crate::EipClient;

/// A typed tag client over a registered EtherNet/IP session.
///
/// Construction connects and registers in one step; each call then maps a
/// tag name and a declared [`CipType`] onto one CIP request/reply exchange.
/// The underlying session is reachable through [`session`](Self::session)
/// for encapsulation-level commands such as List Identity; the TCP stream
/// itself is never exposed.
pub struct PlcClient {
    client: EipClient,
}

impl PlcClient {
    /// Connects to a controller and registers a session.
    pub async fn connect(addr: &str) -> Result<Self> {
        Self::connect_with_config(addr, ClientConfig::default()).await
    }

    /// Connects with an explicit configuration and registers a session.
    ///
    /// The connection is torn down again if registration fails.
    pub async fn connect_with_config(addr: &str, config: ClientConfig) -> Result<Self> {
        let client = EipClient::connect_with_config(addr, config).await?;
        if let Err(e) = client.register_session().await {
            let _ = client.close().await;
            return Err(e);
        }
        Ok(Self { client })
    }

    /// Wraps an already-connected session.
    ///
    /// The session does not have to be registered yet; the first call will
    /// fail with a precondition error if it is not.
    pub fn new(client: EipClient) -> Self {
        Self { client }
    }

    /// The underlying encapsulation session.
    pub fn session(&self) -> &EipClient {
        &self.client
    }

    /// Reads one element of `tag_name`, declared as `declared_type`.
    ///
    /// The reply's embedded data-type code must equal the declared type;
    /// anything else is an [`EipError::TypeMismatch`].
    pub async fn read_tag(&self, tag_name: &str, declared_type: CipType) -> Result<PlcValue> {
        let request = cip::build_read_request(tag_name, 1);
        let response = self.client.send_rr_data(&request).await?;
        let value = cip::parse_read_response(&response, declared_type)?;
        debug!(tag = tag_name, %value, "read tag");
        Ok(value)
    }

    /// Writes `value` to `tag_name`, declared as `declared_type`.
    ///
    /// The value's runtime type must match the declared type; a mismatch is
    /// an [`EipError::Precondition`] raised before any I/O.
    pub async fn write_tag(
        &self,
        tag_name: &str,
        declared_type: CipType,
        value: &PlcValue,
    ) -> Result<()> {
        match value.cip_type() {
            Some(actual) if actual == declared_type => {}
            Some(actual) => {
                return Err(EipError::precondition(format!(
                    "value is {} but tag {} was declared {}",
                    actual, tag_name, declared_type
                )));
            }
            None => {
                return Err(EipError::precondition(format!(
                    "raw values cannot be written to tag {} declared {}",
                    tag_name, declared_type
                )));
            }
        }

        let request =
            cip::build_write_request(tag_name, declared_type.code(), &value.to_bytes());
        let response = self.client.send_rr_data(&request).await?;
        cip::parse_response(&response)?;
        debug!(tag = tag_name, %value, "wrote tag");
        Ok(())
    }

    /// Tears down the session and the connection.
    pub async fn close(&self) -> Result<()> {
        self.client.close().await
    }
}
