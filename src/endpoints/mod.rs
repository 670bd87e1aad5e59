//! Compiled-in endpoint units.
//!
//! Each unit is a thin forwarder: it picks its parameters out of the bag,
//! attaches the session cookies and hands the call to the upstream. Routes
//! come from the unit names (see `registry::naming`).

pub mod forward;

use serde_json::json;

use crate::context::{OutboundCaller, ParamBag};
use crate::dispatch::{Envelope, HandlerResult};
use crate::registry::Unit;

pub use forward::{Field, Forward};

/// Every unit served by the gateway.
pub fn units() -> Vec<Unit> {
    vec![
        Unit::new("inner_version", inner_version),
        Unit::new("login_status", login_status),
        Unit::new("logout", Forward::new("/api/logout")),
        Unit::new("user_account", Forward::new("/api/nuser/account/get")),
        Unit::new(
            "daily_signin",
            Forward::new("/api/point/dailyTask").field(Field::new("type").default_value("0")),
        ),
        Unit::new("personal_fm", Forward::new("/api/v1/radio/get")),
        Unit::new(
            "fm_trash",
            Forward::new("/api/radio/trash/add")
                .field(Field::new("songId").from("id"))
                .field(Field::new("time").default_value("25"))
                .field(Field::new("alg").default_value("RT")),
        ),
    ]
}

/// Report the running gateway version without calling upstream.
async fn inner_version(_params: ParamBag, _caller: OutboundCaller) -> HandlerResult {
    Ok(Envelope::ok(json!({
        "code": 200,
        "data": { "version": env!("CARGO_PKG_VERSION") },
    })))
}

/// Account status, wrapped under `data`.
async fn login_status(params: ParamBag, caller: OutboundCaller) -> HandlerResult {
    let request = Forward::new("/api/w/nuser/account/get").request(&params);
    let reply = caller.call(request).await?;

    Ok(Envelope::ok(json!({ "data": reply.body })).with_cookies(reply.cookie))
}
