//! A provider that reflects its input back to the caller.
//!
//! Useful as a smoke test for a deployment: every verb returns what the
//! engine extracted from the request.

use serde::{Deserialize, Serialize};

use crate::filter::FilterSet;
use crate::provider::{Outcome, Payload, Provider, Reply, RequestContext};

/// Body accepted by `POST` and `PUT`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoInfo {
    pub name: String,
    pub description: String,
}

#[derive(Serialize)]
struct EchoUpdate<'a> {
    filter: &'a FilterSet,
    info: EchoInfo,
}

/// Served at `/echos/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoProvider;

impl EchoProvider {
    pub const NAME: &'static str = "Echo";
}

impl Provider for EchoProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn create(&self, _ctx: &mut RequestContext, input: &Payload) -> Outcome {
        // An undecodable body echoes back as empty fields.
        let info: EchoInfo = input.decode().unwrap_or_default();
        Reply::json(&info)
    }

    fn read(&self, _ctx: &mut RequestContext, filters: &FilterSet) -> Outcome {
        Reply::json(filters)
    }

    fn update(&self, _ctx: &mut RequestContext, filters: &FilterSet, input: &Payload) -> Outcome {
        let info: EchoInfo = input.decode().unwrap_or_default();
        Reply::json(&EchoUpdate {
            filter: filters,
            info,
        })
    }

    fn delete(&self, _ctx: &mut RequestContext, filters: &FilterSet) -> Outcome {
        Reply::json(filters)
    }
}
