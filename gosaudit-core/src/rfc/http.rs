//! JSON RFC gateway transport.
//!
//! Function modules are called through an ICF service that maps JSON
//! request bodies onto importing and table parameters:
//!
//! ```text
//! POST {gateway}/{FUNCTION}?sap-client=100&sap-language=EN
//! Authorization: Basic ...
//! {"QUERY_TABLE": "SOFFPHIO", "FIELDS": [{"FIELDNAME": "PHIO_ID"}], ...}
//! ```
//!
//! The response body carries exporting and table parameters under their
//! ABAP names. Calls are stateless, so a session is a configured HTTP
//! client plus the logon data.
//!
//! # Security
//! - Credentials are only sent as HTTP basic auth, never in the URL
//! - Logged URLs are redacted

use super::{ConnectionConfig, RfcConnector, RfcError, RfcSession, ReadTableRequest, functions};
use crate::error::{GosAuditError, redact_gateway_url};
use crate::models::{DataType, FieldSpec};
use crate::security::Credentials;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

/// Numeric parameters arrive either as JSON numbers or as zero-padded text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AbapNumber {
    Number(u64),
    Text(String),
}

impl AbapNumber {
    fn value(&self) -> Result<u64, RfcError> {
        match self {
            AbapNumber::Number(n) => Ok(*n),
            AbapNumber::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(0);
                }
                trimmed
                    .parse()
                    .map_err(|_| RfcError::Protocol(format!("Invalid number '{}'", text)))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct WorkArea {
    #[serde(rename = "WA")]
    wa: String,
}

#[derive(Debug, Deserialize)]
struct ReadTableResponse {
    #[serde(rename = "DATA", default)]
    data: Vec<WorkArea>,
}

#[derive(Debug, Deserialize)]
struct Dfies {
    #[serde(rename = "FIELDNAME")]
    field_name: String,
    #[serde(rename = "DATATYPE")]
    data_type: String,
    #[serde(rename = "LENG")]
    length: AbapNumber,
}

#[derive(Debug, Deserialize)]
struct FieldInfoResponse {
    #[serde(rename = "DFIES_TAB", default)]
    dfies_tab: Vec<Dfies>,
}

#[derive(Debug, Deserialize)]
struct TableEntry {
    #[serde(rename = "TABNAME")]
    table_name: String,
    #[serde(rename = "TABROWS")]
    table_rows: AbapNumber,
}

#[derive(Debug, Deserialize)]
struct EntriesResponse {
    #[serde(rename = "IT_TABLES", default)]
    tables: Vec<TableEntry>,
}

/// Connector for a JSON RFC gateway.
pub struct HttpConnector {
    config: ConnectionConfig,
    base: Url,
    credentials: Credentials,
    http: reqwest::Client,
}

impl std::fmt::Debug for HttpConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConnector")
            .field("gateway", &redact_gateway_url(self.base.as_str()))
            .field("client", &self.config.client)
            // credentials intentionally omitted
            .finish_non_exhaustive()
    }
}

impl HttpConnector {
    /// Creates a connector for `config`.
    ///
    /// # Errors
    /// Returns a configuration error if the gateway URL is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: ConnectionConfig, credentials: Credentials) -> crate::Result<Self> {
        let base = config.gateway_url()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| {
            GosAuditError::configuration(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            config,
            base,
            credentials,
            http,
        })
    }
}

#[async_trait]
impl RfcConnector for HttpConnector {
    async fn open(&self) -> Result<Box<dyn RfcSession>, RfcError> {
        let session = HttpSession {
            http: self.http.clone(),
            base: self.base.clone(),
            client: self.config.client.clone(),
            language: self.config.language.clone(),
            credentials: self.credentials.clone(),
        };

        session
            .call::<serde_json::Value>(functions::PING, json!({}))
            .await?;

        Ok(Box::new(session))
    }

    fn describe(&self) -> String {
        redact_gateway_url(self.base.as_str())
    }

    fn logon_client(&self) -> &str {
        &self.config.client
    }
}

struct HttpSession {
    http: reqwest::Client,
    base: Url,
    client: String,
    language: String,
    credentials: Credentials,
}

impl HttpSession {
    fn function_url(&self, function: &str) -> Result<Url, RfcError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| RfcError::Protocol("Gateway URL cannot take a path".to_string()))?
            .pop_if_empty()
            .push(function);
        url.query_pairs_mut()
            .append_pair("sap-client", &self.client)
            .append_pair("sap-language", &self.language);
        Ok(url)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        function: &str,
        body: serde_json::Value,
    ) -> Result<T, RfcError> {
        let url = self.function_url(function)?;
        tracing::trace!("Calling {} via {}", function, redact_gateway_url(url.as_str()));

        let response = self
            .http
            .post(url)
            .basic_auth(
                self.credentials.username(),
                Some(self.credentials.password()),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| RfcError::Communication(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RfcError::Logon(format!(
                "{} rejected by gateway (HTTP {})",
                function,
                status.as_u16()
            )));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RfcError::Abap {
                key: format!("HTTP_{}", status.as_u16()),
                message: message.trim().to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RfcError::Protocol(format!("{} response: {}", function, e)))
    }
}

#[async_trait]
impl RfcSession for HttpSession {
    async fn read_table(&self, request: &ReadTableRequest) -> Result<Vec<String>, RfcError> {
        let body = json!({
            "QUERY_TABLE": request.table,
            "DELIMITER": request.delimiter.to_string(),
            "FIELDS": request
                .fields
                .iter()
                .map(|field| json!({ "FIELDNAME": field }))
                .collect::<Vec<_>>(),
            "OPTIONS": request
                .options
                .iter()
                .map(|line| json!({ "TEXT": line }))
                .collect::<Vec<_>>(),
            "ROWSKIPS": request.skip,
            "ROWCOUNT": request.count,
        });

        let response: ReadTableResponse = self.call(functions::READ_TABLE, body).await?;
        Ok(response.data.into_iter().map(|row| row.wa).collect())
    }

    async fn field_info(&self, table: &str) -> Result<Vec<FieldSpec>, RfcError> {
        let response: FieldInfoResponse = self
            .call(functions::FIELD_INFO, json!({ "TABNAME": table }))
            .await?;

        response
            .dfies_tab
            .into_iter()
            .map(|entry| {
                let length = u32::try_from(entry.length.value()?).map_err(|_| {
                    RfcError::Protocol(format!("Length of {} out of range", entry.field_name))
                })?;
                Ok(FieldSpec::new(
                    entry.field_name.trim(),
                    DataType::from_dictionary(&entry.data_type),
                    length,
                ))
            })
            .collect()
    }

    async fn row_count(&self, table: &str) -> Result<u64, RfcError> {
        let response: EntriesResponse = self
            .call(
                functions::ROW_COUNT,
                json!({ "IT_TABLES": [{ "TABNAME": table }] }),
            )
            .await?;

        response
            .tables
            .iter()
            .find(|entry| entry.table_name.trim() == table)
            .or_else(|| response.tables.first())
            .map_or(Ok(0), |entry| entry.table_rows.value())
    }

    async fn close(&mut self) -> Result<(), RfcError> {
        // Stateless gateway calls hold no server-side context to log off.
        tracing::debug!("Released gateway session for client {}", self.client);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abap_number_parsing() {
        assert_eq!(AbapNumber::Number(12).value().unwrap(), 12);
        assert_eq!(AbapNumber::Text("000032".to_string()).value().unwrap(), 32);
        assert_eq!(AbapNumber::Text("  ".to_string()).value().unwrap(), 0);
        assert!(AbapNumber::Text("x".to_string()).value().is_err());
    }

    #[test]
    fn test_function_url() {
        let session = HttpSession {
            http: reqwest::Client::new(),
            base: Url::parse("https://sap.local:44300/sap/bc/rfc/json/").unwrap(),
            client: "100".to_string(),
            language: "EN".to_string(),
            credentials: Credentials::new("RFC_USER", "pw"),
        };

        assert_eq!(
            session.function_url("RFC_READ_TABLE").unwrap().as_str(),
            "https://sap.local:44300/sap/bc/rfc/json/RFC_READ_TABLE?sap-client=100&sap-language=EN"
        );
    }

    #[test]
    fn test_connector_debug_hides_credentials() {
        let connector = HttpConnector::new(
            ConnectionConfig::new("sap.local"),
            Credentials::new("RFC_USER", "topsecret"),
        )
        .unwrap();
        let debug = format!("{:?}", connector);
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("sap.local"));
    }
}
