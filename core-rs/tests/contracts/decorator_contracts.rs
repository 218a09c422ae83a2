//! Request Decorator Contract Tests
//!
//! The decorator reconstructs the call a client originally meant to make.
//! These invariants are what backends and the query processor rely on.

use agent_plane::http::address::{ProxyFlags, BODY_PROPERTY, MEDIA_TYPE_PROPERTY, METHOD_PROPERTY, QUERY_PARAMS_PROPERTY};
use agent_plane::http::decorator::{FORM_URLENCODED, REMOTE_URL_HEADER, SPARQL_QUERY_MEDIA_TYPE};
use agent_plane::http::QueryParams;
use agent_plane::{AddressDescriptor, AgentError, AgentParamsDecorator, TransferEnvelope};

fn decorate(envelope: &TransferEnvelope) -> agent_plane::Result<agent_plane::CallSpec> {
    AgentParamsDecorator::new().decorate(envelope, &envelope.source)
}

fn form_request(id: &str, query_params: Option<&str>, body: &str) -> TransferEnvelope {
    let address = AddressDescriptor::new("https://backend.example/sparql")
        .with_asset_id("GraphAsset")
        .with_proxy(ProxyFlags::all());
    let mut envelope = TransferEnvelope::new(id, address)
        .with_property(METHOD_PROPERTY, "POST")
        .with_property(MEDIA_TYPE_PROPERTY, FORM_URLENCODED)
        .with_property(BODY_PROPERTY, body);
    if let Some(query) = query_params {
        envelope = envelope.with_property(QUERY_PARAMS_PROPERTY, query);
    }
    envelope
}

/// WHY: Transfer mode base urls always end with a separator
/// REASON: The transport appends the path verbatim
/// BREAKS: `http://x` + `sparql` becoming `http://xsparql`
/// SACRIFICES: If this fails, direct transfers hit the wrong host
#[test]
fn transfer_base_url_gets_trailing_separator() {
    let bare = TransferEnvelope::new("req-1", AddressDescriptor::new("http://x"));
    let slashed = TransferEnvelope::new("req-2", AddressDescriptor::new("http://x/"));

    assert_eq!(decorate(&bare).unwrap().base_url, "http://x/");
    assert_eq!(decorate(&slashed).unwrap().base_url, "http://x/");
}

/// WHY: A form-encoded matchmaking request carries exactly one query
/// REASON: The query processor accepts a single SPARQL payload
/// BREAKS: Picking one of two queries silently answers the wrong question
/// SACRIFICES: If this fails, ambiguous requests stop being rejected with their request id
#[test]
fn form_rewrite_requires_exactly_one_query() {
    let single = decorate(&form_request("req-ok", None, "query=SELECT%20*%20WHERE%20%7B%7D")).unwrap();
    assert_eq!(single.content_type.as_deref(), Some(SPARQL_QUERY_MEDIA_TYPE));
    assert_eq!(single.body.as_deref(), Some("SELECT * WHERE {}"));
    assert_eq!(single.header(REMOTE_URL_HEADER), Some("https://backend.example/sparql"));

    for (id, query_params, body) in [
        ("req-none", None, "limit=1"),
        ("req-two", Some("query=ASK%20%7B%7D"), "query=ASK%20%7B%7D"),
    ] {
        match decorate(&form_request(id, query_params, body)) {
            Err(AgentError::MalformedRequest { request_id, .. }) => assert_eq!(request_id, id),
            other => panic!("expected malformed request for {}, got {:?}", id, other),
        }
    }
}

/// WHY: Merged parameters concatenate values, request values first
/// REASON: Backends read repeated keys as lists
/// BREAKS: `{a:[1]}` + `{a:[2]}` collapsing to a single value
/// SACRIFICES: If this fails, static address parameters silently override callers
#[test]
fn parameter_merge_keeps_both_values_in_order() {
    let mut merged = QueryParams::parse("a=1");
    merged.merge(QueryParams::parse("a=2"));
    assert_eq!(merged.get("a"), ["1", "2"]);

    let address = AddressDescriptor::new("http://backend")
        .with_query_params("a=2")
        .with_proxy(ProxyFlags {
            query_params: true,
            ..Default::default()
        });
    let envelope = TransferEnvelope::new("req-3", address).with_property(QUERY_PARAMS_PROPERTY, "a=1");
    assert_eq!(decorate(&envelope).unwrap().query.as_deref(), Some("a=1&a=2"));
}

/// WHY: A proxied method is mandatory; an unproxied one defaults to GET
/// REASON: Guessing the verb of a proxied call can turn a read into a write
/// BREAKS: Missing method silently becoming GET on a proxy address
/// SACRIFICES: If this fails, client contract violations go unnoticed
#[test]
fn proxied_method_is_required() {
    let proxied = AddressDescriptor::new("http://backend").with_proxy(ProxyFlags {
        method: true,
        ..Default::default()
    });
    assert!(matches!(
        decorate(&TransferEnvelope::new("req-4", proxied)),
        Err(AgentError::MalformedRequest { .. })
    ));

    let plain = TransferEnvelope::new("req-5", AddressDescriptor::new("http://backend"));
    assert_eq!(decorate(&plain).unwrap().method, "GET");
}

/// WHY: No parameters serialize to no query string at all
/// REASON: The transport treats `None` as "omit the `?`"
/// BREAKS: Requests ending in a dangling `?`
#[test]
fn empty_parameters_serialize_to_none() {
    let call = decorate(&TransferEnvelope::new("req-6", AddressDescriptor::new("http://backend"))).unwrap();
    assert_eq!(call.query, None);
    assert_eq!(call.url(), "http://backend/");
}
