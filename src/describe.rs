//! Extraction of a [`RequestSnapshot`] from an inbound request.

use crate::core::{
    GeoLocator, RequestSnapshot, RequestSource, UNKNOWN_IP, UNKNOWN_METHOD, UNKNOWN_URL,
    UNKNOWN_USER_AGENT,
};
use axum::extract::{ConnectInfo, Query};
use axum::http::{request::Parts, Extensions, HeaderMap, Method, Request, Uri};
use chrono::{DateTime, Utc};
use chrono_tz::Asia::Jakarta;
use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, instrument};

const FORWARDED_FOR: &str = "x-forwarded-for";
const USER_AGENT: &str = "user-agent";

/// Builds snapshots of inbound requests, enriched with a location.
#[derive(Clone)]
pub struct RequestDescriber {
    locator: Arc<dyn GeoLocator>,
}

impl RequestDescriber {
    pub fn new(locator: Arc<dyn GeoLocator>) -> Self {
        Self { locator }
    }

    /// Captures `request` into a fully populated snapshot.
    ///
    /// Never fails. The geolocation lookup is the only suspending step and any
    /// failure there ends up in the `location` text.
    #[instrument(skip_all)]
    pub async fn describe<R: RequestSource + ?Sized>(&self, request: &R) -> RequestSnapshot {
        let address = resolve_address(request);
        let agent = non_empty(request.header(USER_AGENT))
            .unwrap_or_else(|| UNKNOWN_USER_AGENT.to_string());
        let method = non_empty(request.method()).unwrap_or_else(|| UNKNOWN_METHOD.to_string());
        let path = non_empty(request.url()).unwrap_or_else(|| UNKNOWN_URL.to_string());
        let query = pretty_json(request.query());
        let headers = pretty_json(Some(request.header_map()));
        let timestamp = jakarta_timestamp(Utc::now());

        debug!(%address, %method, %path, "Describing request");
        let location = self.locator.locate(&address).await;

        RequestSnapshot {
            address,
            agent,
            method,
            path,
            query,
            headers,
            location,
            timestamp,
        }
    }
}

/// Forwarded-for header, then the connection peer, then `UNKNOWN_IP`.
fn resolve_address<R: RequestSource + ?Sized>(request: &R) -> String {
    non_empty(request.header(FORWARDED_FOR))
        .or_else(|| request.remote_addr().map(|ip| ip.to_string()))
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Renders a map as indented JSON. Absent or empty maps render as `{}`.
pub fn pretty_json(map: Option<BTreeMap<String, String>>) -> String {
    match map {
        Some(map) if !map.is_empty() => {
            serde_json::to_string_pretty(&map).unwrap_or_else(|_| "{}".to_string())
        }
        _ => "{}".to_string(),
    }
}

/// Formats `now` in Asia/Jakarta using the Indonesian `dd/mm/yyyy, HH.MM.SS`
/// layout, regardless of the host's time zone.
pub fn jakarta_timestamp(now: DateTime<Utc>) -> String {
    now.with_timezone(&Jakarta)
        .format("%d/%m/%Y, %H.%M.%S")
        .to_string()
}

/// An owned copy of a request head, detached from the body so it can be
/// described after the request has been handed on.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    headers: HeaderMap,
    method: Method,
    uri: Uri,
    peer: Option<IpAddr>,
}

impl CapturedRequest {
    pub fn capture<B>(request: &Request<B>) -> Self {
        Self {
            headers: request.headers().clone(),
            method: request.method().clone(),
            uri: request.uri().clone(),
            peer: peer_ip(request.extensions()),
        }
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }
}

// =============================================================================
// RequestSource for http types
// =============================================================================

impl RequestSource for CapturedRequest {
    fn header(&self, name: &str) -> Option<String> {
        header_value(&self.headers, name)
    }

    fn header_map(&self) -> BTreeMap<String, String> {
        collect_headers(&self.headers)
    }

    fn remote_addr(&self) -> Option<IpAddr> {
        self.peer
    }

    fn method(&self) -> Option<String> {
        method_name(&self.method)
    }

    fn url(&self) -> Option<String> {
        target(&self.uri)
    }

    fn query(&self) -> Option<BTreeMap<String, String>> {
        parse_query(&self.uri)
    }
}

/// Every non-empty line of header `name`, joined with `", "`. Proxies may
/// append their own `x-forwarded-for` line instead of extending the first.
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let values: Vec<String> = headers
        .get_all(name)
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .filter(|v| !v.trim().is_empty())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        map.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    map
}

fn peer_ip(extensions: &Extensions) -> Option<IpAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn target(uri: &Uri) -> Option<String> {
    uri.path_and_query().map(|pq| pq.as_str().to_string())
}

fn parse_query(uri: &Uri) -> Option<BTreeMap<String, String>> {
    uri.query()?;
    Query::<BTreeMap<String, String>>::try_from_uri(uri)
        .ok()
        .map(|Query(params)| params)
}

fn method_name(method: &Method) -> Option<String> {
    Some(method.as_str().to_string())
}

impl RequestSource for Parts {
    fn header(&self, name: &str) -> Option<String> {
        header_value(&self.headers, name)
    }

    fn header_map(&self) -> BTreeMap<String, String> {
        collect_headers(&self.headers)
    }

    fn remote_addr(&self) -> Option<IpAddr> {
        peer_ip(&self.extensions)
    }

    fn method(&self) -> Option<String> {
        method_name(&self.method)
    }

    fn url(&self) -> Option<String> {
        target(&self.uri)
    }

    fn query(&self) -> Option<BTreeMap<String, String>> {
        parse_query(&self.uri)
    }
}

impl<B> RequestSource for Request<B> {
    fn header(&self, name: &str) -> Option<String> {
        header_value(self.headers(), name)
    }

    fn header_map(&self) -> BTreeMap<String, String> {
        collect_headers(self.headers())
    }

    fn remote_addr(&self) -> Option<IpAddr> {
        peer_ip(self.extensions())
    }

    fn method(&self) -> Option<String> {
        method_name(Request::method(self))
    }

    fn url(&self) -> Option<String> {
        target(self.uri())
    }

    fn query(&self) -> Option<BTreeMap<String, String>> {
        parse_query(self.uri())
    }
}
