// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command dispatcher: routes channel commands to the engine and the SDK and
// turns every outcome into a reply for the host.
//
// The bridge starts `Uninitialized`. `init` moves it to `Ready`, which owns
// the configuration and identity state. Privacy rules and HTTP parameters
// live outside the session and can be changed at any time.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use pianobridge_core::config::{
    Configuration, DEFAULT_PATH, DEFAULT_VISITOR_STORAGE_LIFETIME, HttpParameters,
};
use pianobridge_core::error::{BridgeError, Result};
use pianobridge_core::types::{User, VisitorIdType, VisitorStorageMode};
use pianobridge_core::value::Value;
use pianobridge_engine::{Identity, PrivacyRegistry, build_events};

use crate::args::Args;
use crate::codec::{decode_method_call, encode_error, encode_success};
use crate::traits::{AnalyticsSdk, HostContext, Transmission};

/// Error code used when a message cannot be decoded into a method call.
pub const MALFORMED_MESSAGE_CODE: &str = "malformed";

/// A failed command as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct CommandError {
    /// Name of the command that failed.
    pub code: String,
    pub message: String,
}

impl CommandError {
    fn new(method: &str, error: &BridgeError) -> Self {
        Self {
            code: method.to_owned(),
            message: error.to_string(),
        }
    }
}

/// Every command the channel understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Init,
    SetHeader,
    SetQuery,
    Send,
    GetUser,
    SetUser,
    DeleteUser,
    GetVisitorId,
    SetVisitorId,
    PrivacyIncludeStorageFeatures,
    PrivacyExcludeStorageFeatures,
    PrivacyIncludeProperties,
    PrivacyExcludeProperties,
    PrivacyIncludeEvents,
    PrivacyExcludeEvents,
}

impl Command {
    pub const ALL: [Command; 15] = [
        Command::Init,
        Command::SetHeader,
        Command::SetQuery,
        Command::Send,
        Command::GetUser,
        Command::SetUser,
        Command::DeleteUser,
        Command::GetVisitorId,
        Command::SetVisitorId,
        Command::PrivacyIncludeStorageFeatures,
        Command::PrivacyExcludeStorageFeatures,
        Command::PrivacyIncludeProperties,
        Command::PrivacyExcludeProperties,
        Command::PrivacyIncludeEvents,
        Command::PrivacyExcludeEvents,
    ];

    /// Method name on the channel.
    pub fn method(&self) -> &'static str {
        match self {
            Command::Init => "init",
            Command::SetHeader => "setHeader",
            Command::SetQuery => "setQuery",
            Command::Send => "send",
            Command::GetUser => "getUser",
            Command::SetUser => "setUser",
            Command::DeleteUser => "deleteUser",
            Command::GetVisitorId => "getVisitorId",
            Command::SetVisitorId => "setVisitorId",
            Command::PrivacyIncludeStorageFeatures => "privacyIncludeStorageFeatures",
            Command::PrivacyExcludeStorageFeatures => "privacyExcludeStorageFeatures",
            Command::PrivacyIncludeProperties => "privacyIncludeProperties",
            Command::PrivacyExcludeProperties => "privacyExcludeProperties",
            Command::PrivacyIncludeEvents => "privacyIncludeEvents",
            Command::PrivacyExcludeEvents => "privacyExcludeEvents",
        }
    }

    pub fn from_method(method: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.method() == method)
    }
}

struct Session {
    config: Configuration,
    identity: Identity,
}

enum State {
    Uninitialized,
    Ready(Session),
}

/// The bridge between the host channel and the analytics SDK.
///
/// Commands take `&mut self` and run to completion; a host calling from
/// several threads wraps the bridge in a `Mutex`. The privacy registry is
/// shared through an `Arc` and carries its own lock.
pub struct AnalyticsBridge {
    sdk: Arc<dyn AnalyticsSdk>,
    host: Arc<dyn HostContext>,
    privacy: Arc<PrivacyRegistry>,
    http: HttpParameters,
    state: State,
}

impl AnalyticsBridge {
    pub fn new(sdk: Arc<dyn AnalyticsSdk>, host: Arc<dyn HostContext>) -> Self {
        Self::with_privacy(sdk, host, Arc::new(PrivacyRegistry::new()))
    }

    /// Build a bridge around an existing rule registry.
    pub fn with_privacy(
        sdk: Arc<dyn AnalyticsSdk>,
        host: Arc<dyn HostContext>,
        privacy: Arc<PrivacyRegistry>,
    ) -> Self {
        Self {
            sdk,
            host,
            privacy,
            http: HttpParameters::default(),
            state: State::Uninitialized,
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// Active configuration, once initialised.
    pub fn configuration(&self) -> Option<&Configuration> {
        match &self.state {
            State::Ready(session) => Some(&session.config),
            State::Uninitialized => None,
        }
    }

    pub fn privacy(&self) -> &Arc<PrivacyRegistry> {
        &self.privacy
    }

    pub fn http_parameters(&self) -> &HttpParameters {
        &self.http
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Decode one channel message, run it and encode the reply envelope.
    pub fn handle_message(&mut self, message: &[u8]) -> Vec<u8> {
        match decode_method_call(message) {
            Ok(call) => match self.handle(&call.method, &call.arguments) {
                Ok(result) => encode_success(&result),
                Err(e) => encode_error(&e.code, &e.message),
            },
            Err(e) => {
                warn!(error = %e, len = message.len(), "undecodable channel message");
                encode_error(MALFORMED_MESSAGE_CODE, &e.to_string())
            }
        }
    }

    /// Run one command. Failures carry the method name as their code.
    #[instrument(skip(self, arguments))]
    pub fn handle(&mut self, method: &str, arguments: &Value) -> std::result::Result<Value, CommandError> {
        let args = Args::new(arguments);
        let result = match Command::from_method(method) {
            Some(command) => self.execute(command, &args),
            None => Err(BridgeError::UnknownMethod(method.to_owned())),
        };
        result.map_err(|e| {
            warn!(error = %e, "command failed");
            CommandError::new(method, &e)
        })
    }

    fn execute(&mut self, command: Command, args: &Args<'_>) -> Result<Value> {
        match command {
            Command::Init => self.init(args),
            Command::SetHeader => {
                let key = args.str("key")?;
                self.http.set_header(key, args.opt_str("value").map(str::to_owned));
                Ok(Value::Null)
            }
            Command::SetQuery => {
                let key = args.str("key")?;
                self.http.set_query(key, args.opt_str("value").map(str::to_owned));
                Ok(Value::Null)
            }
            Command::Send => self.send(args),
            Command::GetUser => {
                let user = self.session()?.identity.user();
                Ok(user.map_or(Value::Null, |user| {
                    Value::map([
                        ("id", Value::from(user.id.as_str())),
                        ("category", Value::from(user.category.clone())),
                    ])
                }))
            }
            Command::SetUser => {
                let id = args.str("id")?;
                let user = User::new(
                    id,
                    args.opt_str("category").map(str::to_owned),
                    args.opt_bool("enableStorage").unwrap_or(true),
                );
                self.session_mut()?.identity.set_user(user);
                Ok(Value::Null)
            }
            Command::DeleteUser => {
                self.session_mut()?.identity.delete_user();
                Ok(Value::Null)
            }
            Command::GetVisitorId => Ok(Value::from(self.session()?.identity.visitor_id())),
            Command::SetVisitorId => {
                let id = args.str("visitorId")?;
                self.session_mut()?.identity.set_custom_visitor_id(id);
                Ok(Value::Null)
            }
            Command::PrivacyIncludeStorageFeatures => self.privacy_storage_features(args, true),
            Command::PrivacyExcludeStorageFeatures => self.privacy_storage_features(args, false),
            Command::PrivacyIncludeProperties => self.privacy_properties(args, true),
            Command::PrivacyExcludeProperties => self.privacy_properties(args, false),
            Command::PrivacyIncludeEvents => self.privacy_events(args, true),
            Command::PrivacyExcludeEvents => self.privacy_events(args, false),
        }
    }

    fn session(&self) -> Result<&Session> {
        match &self.state {
            State::Ready(session) => Ok(session),
            State::Uninitialized => Err(BridgeError::NotInitialized),
        }
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        match &mut self.state {
            State::Ready(session) => Ok(session),
            State::Uninitialized => Err(BridgeError::NotInitialized),
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// First call starts the SDK; later calls only move the endpoint.
    fn init(&mut self, args: &Args<'_>) -> Result<Value> {
        let site = args.i32("site")?;
        let collect_domain = args.str("collectDomain")?;

        if let State::Ready(session) = &mut self.state {
            self.sdk.update_endpoint(collect_domain, site)?;
            session.config.collect_domain = collect_domain.to_owned();
            session.config.site = site;
            info!(site, collect_domain, "analytics endpoint updated");
            return Ok(Value::Null);
        }

        let visitor_id_type = VisitorIdType::from_name(args.str("visitorIDType")?);
        let lifetime_arg = ["visitorStorageLifetime", "storageLifetimeVisitor"]
            .into_iter()
            .find_map(|key| args.opt_i32(key).map(|days| (key, days)));
        let visitor_storage_lifetime = match lifetime_arg {
            Some((key, days)) => u32::try_from(days).map_err(|_| BridgeError::InvalidArgument {
                key: key.to_owned(),
                value: days.to_string(),
            })?,
            None => DEFAULT_VISITOR_STORAGE_LIFETIME,
        };
        let config = Configuration {
            site,
            collect_domain: collect_domain.to_owned(),
            path: DEFAULT_PATH.to_owned(),
            visitor_id_type,
            visitor_storage_lifetime,
            visitor_storage_mode: VisitorStorageMode::from_name(args.opt_str("visitorStorageMode")),
            ignore_limited_ad_tracking: args
                .opt_bool("ignoreLimitedAdvertisingTracking")
                .unwrap_or(false),
        };

        let host = self.host.attached().ok_or(BridgeError::HostNotAttached)?;

        for (key, value) in args.str_map("headers") {
            self.http.set_header(key, Some(value.to_owned()));
        }
        for (key, value) in args.str_map("query") {
            self.http.set_query(key, Some(value.to_owned()));
        }

        self.sdk.start(&config, &host)?;

        let mut identity = Identity::new(
            visitor_id_type,
            host.advertising.as_ref(),
            config.ignore_limited_ad_tracking,
        );
        if visitor_id_type == VisitorIdType::Custom {
            if let Some(id) = args.opt_str("visitorId") {
                identity.set_custom_visitor_id(id);
            }
        }

        info!(
            url = %config.report_url(),
            platform = %host.platform,
            ?visitor_id_type,
            "analytics initialized"
        );
        self.state = State::Ready(Session { config, identity });
        Ok(Value::Null)
    }

    /// Build the whole batch, then hand it to the SDK in one transmission.
    fn send(&self, args: &Args<'_>) -> Result<Value> {
        let session = self.session()?;
        let events = build_events(args.list("events")?)?;

        self.sdk.send(Transmission {
            events: &events,
            visitor_id: session.identity.visitor_id(),
            user: session.identity.user(),
            http: &self.http,
            privacy: &self.privacy,
        })?;
        info!(count = events.len(), "events sent");
        Ok(Value::Null)
    }

    fn privacy_storage_features(&self, args: &Args<'_>, include: bool) -> Result<Value> {
        let features = args.str_list("features")?;
        let modes = args.str_list("modes")?;
        self.privacy
            .update_storage_features(features.as_slice(), modes.as_slice(), include)?;
        Ok(Value::Null)
    }

    fn privacy_properties(&self, args: &Args<'_>, include: bool) -> Result<Value> {
        let property_names = args.str_list("propertyNames")?;
        let modes = args.str_list("modes")?;
        let event_names = args.opt_str_list("eventNames")?;
        self.privacy.update_property_names(
            property_names.as_slice(),
            modes.as_slice(),
            include,
            event_names.as_deref(),
        )?;
        Ok(Value::Null)
    }

    fn privacy_events(&self, args: &Args<'_>, include: bool) -> Result<Value> {
        let event_names = args.str_list("eventNames")?;
        let modes = args.str_list("modes")?;
        self.privacy
            .update_event_names(event_names.as_slice(), modes.as_slice(), include)?;
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{MethodCall, Reply, decode_reply, encode_method_call};
    use crate::stub::{RecordingSdk, StaticHost};
    use chrono::{TimeZone, Utc};
    use pianobridge_core::types::{
        AdvertisingInfo, Event, ForceType, PrivacyMode, PropertyValue, StorageFeature,
    };
    use pianobridge_engine::identity::OPT_OUT_VISITOR_ID;
    use serde_json::json;

    fn bridge_with(host: StaticHost) -> (AnalyticsBridge, Arc<RecordingSdk>) {
        let sdk = Arc::new(RecordingSdk::new());
        let bridge = AnalyticsBridge::new(sdk.clone(), Arc::new(host));
        (bridge, sdk)
    }

    fn bridge() -> (AnalyticsBridge, Arc<RecordingSdk>) {
        bridge_with(StaticHost::desktop())
    }

    fn call(bridge: &mut AnalyticsBridge, method: &str, args: serde_json::Value) -> std::result::Result<Value, CommandError> {
        bridge.handle(method, &Value::from(args))
    }

    fn init_args(visitor_id_type: &str) -> serde_json::Value {
        json!({
            "site": 123456789,
            "collectDomain": "xxxxxxx.pa-cd.com",
            "visitorIDType": visitor_id_type
        })
    }

    fn ready(visitor_id_type: &str) -> (AnalyticsBridge, Arc<RecordingSdk>) {
        let (mut bridge, sdk) = bridge();
        call(&mut bridge, "init", init_args(visitor_id_type)).expect("init");
        (bridge, sdk)
    }

    #[test]
    fn every_command_roundtrips_its_method_name() {
        for command in Command::ALL {
            assert_eq!(Command::from_method(command.method()), Some(command));
        }
        assert_eq!(Command::from_method("track"), None);
    }

    #[test]
    fn init_starts_sdk_with_configuration() {
        let (mut bridge, sdk) = bridge();
        assert!(!bridge.is_initialized());

        call(
            &mut bridge,
            "init",
            json!({
                "site": 123456789,
                "collectDomain": "xxxxxxx.pa-cd.com",
                "visitorIDType": "UUID",
                "visitorStorageLifetime": 30,
                "visitorStorageMode": "relative",
                "ignoreLimitedAdvertisingTracking": true
            }),
        )
        .expect("init");

        assert!(bridge.is_initialized());
        let starts = sdk.starts();
        assert_eq!(starts.len(), 1);
        let (config, host) = &starts[0];
        assert_eq!(config.site, 123456789);
        assert_eq!(config.collect_domain, "xxxxxxx.pa-cd.com");
        assert_eq!(config.visitor_storage_lifetime, 30);
        assert_eq!(config.visitor_storage_mode, VisitorStorageMode::Relative);
        assert!(config.ignore_limited_ad_tracking);
        assert_eq!(config.report_url(), "https://xxxxxxx.pa-cd.com/event?s=123456789");
        assert_eq!(host.platform, "Desktop (stub)");
    }

    #[test]
    fn init_defaults() {
        let (bridge, _) = ready("UUID");
        let config = bridge.configuration().expect("ready");
        assert_eq!(config.visitor_storage_lifetime, DEFAULT_VISITOR_STORAGE_LIFETIME);
        assert_eq!(config.visitor_storage_mode, VisitorStorageMode::Fixed);
        assert_eq!(config.visitor_id_type, VisitorIdType::Uuid);
        assert!(!config.ignore_limited_ad_tracking);
    }

    #[test]
    fn init_accepts_legacy_lifetime_key() {
        let (mut bridge, _) = bridge();
        let mut args = init_args("UUID");
        args["storageLifetimeVisitor"] = json!(10);
        call(&mut bridge, "init", args).expect("init");
        assert_eq!(bridge.configuration().map(|c| c.visitor_storage_lifetime), Some(10));
    }

    #[test]
    fn init_rejects_negative_lifetime() {
        let (mut bridge, _) = bridge();
        let mut args = init_args("UUID");
        args["visitorStorageLifetime"] = json!(-1);
        let err = call(&mut bridge, "init", args).unwrap_err();
        assert_eq!(err.code, "init");
        assert_eq!(err.message, "invalid value \"-1\" for argument \"visitorStorageLifetime\"");
        assert!(!bridge.is_initialized());

        let mut args = init_args("UUID");
        args["storageLifetimeVisitor"] = json!(-7);
        let err = call(&mut bridge, "init", args).unwrap_err();
        assert_eq!(err.message, "invalid value \"-7\" for argument \"storageLifetimeVisitor\"");
    }

    #[test]
    fn init_missing_argument_reports_key() {
        let (mut bridge, sdk) = bridge();
        let err = call(&mut bridge, "init", json!({"collectDomain": "d", "visitorIDType": "UUID"})).unwrap_err();
        assert_eq!(err.code, "init");
        assert_eq!(err.message, "undefined argument \"site\"");
        assert!(sdk.starts().is_empty());
    }

    #[test]
    fn init_without_host_stays_uninitialized() {
        let (mut bridge, sdk) = bridge_with(StaticHost::detached());
        let err = call(&mut bridge, "init", init_args("UUID")).unwrap_err();
        assert_eq!(err.code, "init");
        assert_eq!(err.message, BridgeError::HostNotAttached.to_string());
        assert!(!bridge.is_initialized());
        assert!(sdk.starts().is_empty());
    }

    #[test]
    fn reinit_only_moves_endpoint() {
        let (mut bridge, sdk) = ready("UUID");
        let visitor_id = call(&mut bridge, "getVisitorId", json!(null)).expect("id");

        call(
            &mut bridge,
            "init",
            json!({"site": 42, "collectDomain": "other.pa-cd.com", "visitorIDType": "CUSTOM"}),
        )
        .expect("reinit");

        assert_eq!(sdk.starts().len(), 1);
        assert_eq!(sdk.endpoints(), [("other.pa-cd.com".to_owned(), 42)]);
        let config = bridge.configuration().expect("ready");
        assert_eq!(config.site, 42);
        assert_eq!(config.collect_domain, "other.pa-cd.com");
        assert_eq!(config.visitor_id_type, VisitorIdType::Uuid);
        assert_eq!(call(&mut bridge, "getVisitorId", json!(null)).expect("id"), visitor_id);
    }

    #[test]
    fn commands_requiring_session_fail_before_init() {
        let (mut bridge, sdk) = bridge();
        for method in ["send", "getUser", "setUser", "deleteUser", "getVisitorId", "setVisitorId"] {
            let err = call(
                &mut bridge,
                method,
                json!({"events": [], "id": "u", "visitorId": "v"}),
            )
            .unwrap_err();
            assert_eq!(err.code, method);
            assert_eq!(err.message, BridgeError::NotInitialized.to_string());
        }
        assert!(sdk.sends().is_empty());
    }

    #[test]
    fn send_transmits_batch_with_identity_and_http_parameters() {
        let (mut bridge, sdk) = bridge();
        call(&mut bridge, "setHeader", json!({"key": "X-Early", "value": "1"})).expect("header");
        let mut args = init_args("CUSTOM");
        args["visitorId"] = json!("WEB-192203AJ");
        args["headers"] = json!({"X-Init": "2"});
        args["query"] = json!({"env": "test"});
        call(&mut bridge, "init", args).expect("init");
        call(&mut bridge, "setUser", json!({"id": "user-1", "category": "premium"})).expect("user");

        call(
            &mut bridge,
            "send",
            json!({"events": [
                {"name": "page.display", "data": {
                    "bool": {"value": true},
                    "arr": {"value": [1, 2, 3]},
                    "int_force": {"value": "1", "forceType": "n"}
                }},
                {"name": "click.action"}
            ]}),
        )
        .expect("send");

        let sends = sdk.sends();
        assert_eq!(sends.len(), 1);
        let sent = &sends[0];
        let names: Vec<_> = sent.events.iter().map(Event::name).collect();
        assert_eq!(names, [Event::PAGE_DISPLAY, Event::CLICK_ACTION]);

        let page = &sent.events[0];
        assert_eq!(page.property("bool").map(|p| p.value()), Some(&PropertyValue::Bool(true)));
        assert_eq!(
            page.property("arr").map(|p| p.value()),
            Some(&PropertyValue::IntArray(vec![1, 2, 3]))
        );
        assert_eq!(
            page.property("int_force").and_then(|p| p.force_type()),
            Some(ForceType::Integer)
        );

        assert_eq!(sent.visitor_id.as_deref(), Some("WEB-192203AJ"));
        assert_eq!(sent.user.as_ref().map(|u| u.id.as_str()), Some("user-1"));
        assert_eq!(sent.http.headers.get("X-Early").map(String::as_str), Some("1"));
        assert_eq!(sent.http.headers.get("X-Init").map(String::as_str), Some("2"));
        assert_eq!(sent.http.query.get("env").map(String::as_str), Some("test"));
    }

    #[test]
    fn malformed_batch_transmits_nothing() {
        let (mut bridge, sdk) = ready("UUID");
        let err = call(
            &mut bridge,
            "send",
            json!({"events": [{"name": "page.display"}, {"data": {}}]}),
        )
        .unwrap_err();
        assert_eq!(err.code, "send");
        assert_eq!(err.message, BridgeError::MissingEventName.to_string());
        assert!(sdk.sends().is_empty());

        let err = call(&mut bridge, "send", json!({})).unwrap_err();
        assert_eq!(err.message, "undefined argument \"events\"");
    }

    #[test]
    fn sdk_failure_is_reported() {
        let (mut bridge, sdk) = ready("UUID");
        sdk.fail_sends(true);
        let err = call(&mut bridge, "send", json!({"events": [{"name": "page.display"}]})).unwrap_err();
        assert_eq!(err.code, "send");
        assert!(err.message.contains("send rejected"));
    }

    #[test]
    fn headers_and_query_can_be_removed() {
        let (mut bridge, _) = bridge();
        call(&mut bridge, "setHeader", json!({"key": "X-A", "value": "1"})).expect("set");
        call(&mut bridge, "setQuery", json!({"key": "q", "value": "v"})).expect("set");
        assert_eq!(bridge.http_parameters().headers.len(), 1);
        assert_eq!(bridge.http_parameters().query.len(), 1);

        call(&mut bridge, "setHeader", json!({"key": "X-A"})).expect("remove");
        call(&mut bridge, "setQuery", json!({"key": "q", "value": null})).expect("remove");
        assert!(bridge.http_parameters().headers.is_empty());
        assert!(bridge.http_parameters().query.is_empty());

        let err = call(&mut bridge, "setHeader", json!({"value": "1"})).unwrap_err();
        assert_eq!(err.message, "undefined argument \"key\"");
    }

    #[test]
    fn user_lifecycle() {
        let (mut bridge, _) = ready("UUID");
        assert_eq!(call(&mut bridge, "getUser", json!(null)).expect("get"), Value::Null);

        call(&mut bridge, "setUser", json!({"id": "WEB-192203AJ", "enableStorage": false})).expect("set");
        let user = call(&mut bridge, "getUser", json!(null)).expect("get");
        assert_eq!(user.get("id").and_then(Value::as_str), Some("WEB-192203AJ"));
        assert_eq!(user.get("category"), Some(&Value::Null));

        call(&mut bridge, "deleteUser", json!(null)).expect("delete");
        assert_eq!(call(&mut bridge, "getUser", json!(null)).expect("get"), Value::Null);

        let err = call(&mut bridge, "setUser", json!({"category": "c"})).unwrap_err();
        assert_eq!(err.message, "undefined argument \"id\"");
    }

    #[test]
    fn visitor_id_rules() {
        let (mut uuid, _) = ready("UUID");
        let id = call(&mut uuid, "getVisitorId", json!(null)).expect("id");
        assert!(id.as_str().is_some());
        call(&mut uuid, "setVisitorId", json!({"visitorId": "WEB-192203AJ"})).expect("set");
        assert_eq!(call(&mut uuid, "getVisitorId", json!(null)).expect("id"), id);

        let (mut custom, _) = ready("CUSTOM");
        assert_eq!(call(&mut custom, "getVisitorId", json!(null)).expect("id"), Value::Null);
        call(&mut custom, "setVisitorId", json!({"visitorId": "WEB-192203AJ"})).expect("set");
        assert_eq!(
            call(&mut custom, "getVisitorId", json!(null)).expect("id"),
            Value::from("WEB-192203AJ")
        );
    }

    #[test]
    fn limited_ad_tracking_reports_opt_out() {
        let (mut bridge, _) = bridge_with(StaticHost::with_advertising(AdvertisingInfo {
            id: "38400000-8cf0-11bd-b23e-10b96e40000d".into(),
            limit_ad_tracking: true,
        }));
        call(&mut bridge, "init", init_args("ADID")).expect("init");
        assert_eq!(
            call(&mut bridge, "getVisitorId", json!(null)).expect("id"),
            Value::from(OPT_OUT_VISITOR_ID)
        );
    }

    #[test]
    fn privacy_commands_work_before_init() {
        let (mut bridge, _) = bridge();
        call(
            &mut bridge,
            "privacyIncludeStorageFeatures",
            json!({"features": ["CRASH"], "modes": ["exempt"]}),
        )
        .expect("include");
        call(
            &mut bridge,
            "privacyExcludeStorageFeatures",
            json!({"features": ["VISITOR"], "modes": ["custom"]}),
        )
        .expect("exclude");
        call(
            &mut bridge,
            "privacyIncludeEvents",
            json!({"eventNames": ["page.display"], "modes": ["opt-out"]}),
        )
        .expect("events");
        call(
            &mut bridge,
            "privacyExcludeProperties",
            json!({"propertyNames": ["p1"], "modes": ["no-consent"]}),
        )
        .expect("properties");
        call(
            &mut bridge,
            "privacyIncludeProperties",
            json!({"propertyNames": ["p1", "p2"], "modes": ["exempt"], "eventNames": ["page.display"]}),
        )
        .expect("properties");

        let registry = bridge.privacy();
        let exempt = registry.snapshot(PrivacyMode::Exempt);
        assert!(exempt.allowed_storage_features.contains(&StorageFeature::Crash));
        assert!(exempt.forbidden_storage_features.is_empty());
        assert_eq!(
            exempt.allowed_property_keys.get("page.display").map(|s| s.len()),
            Some(2)
        );
        assert!(
            registry
                .snapshot(PrivacyMode::Custom)
                .forbidden_storage_features
                .contains(&StorageFeature::Visitor)
        );
        assert!(
            registry
                .snapshot(PrivacyMode::OptOut)
                .allowed_event_names
                .contains("page.display")
        );
        assert!(
            registry
                .snapshot(PrivacyMode::NoConsent)
                .forbidden_property_keys
                .contains_key(Event::ANY)
        );
    }

    #[test]
    fn invalid_privacy_names_change_nothing() {
        let (mut bridge, _) = bridge();
        let err = call(
            &mut bridge,
            "privacyIncludeStorageFeatures",
            json!({"features": ["CRASH"], "modes": ["exempt", "bogus"]}),
        )
        .unwrap_err();
        assert_eq!(err.code, "privacyIncludeStorageFeatures");
        assert!(err.message.contains("bogus"));
        assert!(bridge.privacy().snapshot(PrivacyMode::Exempt).allowed_storage_features.is_empty());

        let err = call(&mut bridge, "privacyIncludeEvents", json!({"modes": ["exempt"]})).unwrap_err();
        assert_eq!(err.message, "undefined argument \"eventNames\"");
    }

    #[test]
    fn unknown_method_is_an_error() {
        let (mut bridge, _) = bridge();
        let err = call(&mut bridge, "track", json!(null)).unwrap_err();
        assert_eq!(err.code, "track");
        assert_eq!(err.message, "unknown method \"track\"");
    }

    #[test]
    fn handle_message_end_to_end() {
        let (mut bridge, sdk) = bridge();
        let reply = bridge.handle_message(&encode_method_call(&MethodCall::new(
            "init",
            Value::from(init_args("UUID")),
        )));
        assert_eq!(decode_reply(&reply).expect("reply"), Reply::Success(Value::Null));

        let date = Utc.timestamp_millis_opt(1_700_000_000_123).single().expect("date");
        let events = Value::List(vec![Value::map([
            ("name", Value::from("page.display")),
            (
                "data",
                Value::map([("when", Value::map([("value", Value::Date(date))]))]),
            ),
        ])]);
        let reply = bridge.handle_message(&encode_method_call(&MethodCall::new(
            "send",
            Value::map([("events", events)]),
        )));
        assert_eq!(decode_reply(&reply).expect("reply"), Reply::Success(Value::Null));

        let sends = sdk.sends();
        let when = sends[0].events[0].property("when").expect("property");
        assert_eq!(when.value(), &PropertyValue::Date(date));
    }

    #[test]
    fn handle_message_error_envelopes() {
        let (mut bridge, _) = bridge();
        let reply = bridge.handle_message(&encode_method_call(&MethodCall::new("getUser", Value::Null)));
        assert_eq!(
            decode_reply(&reply).expect("reply"),
            Reply::Error {
                code: "getUser".into(),
                message: Some(BridgeError::NotInitialized.to_string()),
                details: Value::Null,
            }
        );

        let reply = bridge.handle_message(&[0xFF]);
        match decode_reply(&reply).expect("reply") {
            Reply::Error { code, details, .. } => {
                assert_eq!(code, MALFORMED_MESSAGE_CODE);
                assert!(details.is_null());
            }
            other => panic!("expected error reply, got {other:?}"),
        }
    }
}
