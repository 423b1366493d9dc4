// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Visitor and user identity for an initialised analytics session.

use tracing::{debug, info};
use uuid::Uuid;

use pianobridge_core::types::{AdvertisingInfo, User, VisitorIdType};

/// Visitor id reported when the advertising id is selected but the user has
/// limited ad tracking.
pub const OPT_OUT_VISITOR_ID: &str = "opt-out";

/// Identity state owned by a ready session.
#[derive(Debug, Clone)]
pub struct Identity {
    visitor_id_type: VisitorIdType,
    /// Id derived from the identity source (UUID or advertising id).
    visitor_id: String,
    /// Id supplied by the application; only reported with `Custom`.
    custom_visitor_id: Option<String>,
    user: Option<User>,
}

impl Identity {
    /// Derive the visitor id for `visitor_id_type`.
    ///
    /// With the advertising id selected, a missing id falls back to a random
    /// UUID; a limited-tracking id becomes [`OPT_OUT_VISITOR_ID`] unless
    /// `ignore_limited_ad_tracking` asks for a random UUID instead.
    pub fn new(
        visitor_id_type: VisitorIdType,
        advertising: Option<&AdvertisingInfo>,
        ignore_limited_ad_tracking: bool,
    ) -> Self {
        let visitor_id = match (visitor_id_type, advertising) {
            (VisitorIdType::AdvertisingId, Some(ad)) if !ad.limit_ad_tracking => ad.id.clone(),
            (VisitorIdType::AdvertisingId, Some(_)) if !ignore_limited_ad_tracking => {
                OPT_OUT_VISITOR_ID.to_owned()
            }
            _ => Uuid::new_v4().to_string(),
        };
        debug!(?visitor_id_type, "visitor identity derived");

        Self {
            visitor_id_type,
            visitor_id,
            custom_visitor_id: None,
            user: None,
        }
    }

    pub fn visitor_id_type(&self) -> VisitorIdType {
        self.visitor_id_type
    }

    /// Visitor id as reported to the host: the custom id when the type is
    /// `Custom` (absent until one is set), the derived id otherwise.
    pub fn visitor_id(&self) -> Option<&str> {
        match self.visitor_id_type {
            VisitorIdType::Custom => self.custom_visitor_id.as_deref(),
            VisitorIdType::Uuid | VisitorIdType::AdvertisingId => Some(&self.visitor_id),
        }
    }

    /// Store a custom visitor id. Accepted for every visitor id type but only
    /// reported when the type is `Custom`.
    pub fn set_custom_visitor_id(&mut self, id: impl Into<String>) {
        self.custom_visitor_id = Some(id.into());
        if self.visitor_id_type != VisitorIdType::Custom {
            debug!(
                visitor_id_type = ?self.visitor_id_type,
                "custom visitor id stored but not in effect"
            );
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Replace the current user.
    pub fn set_user(&mut self, user: User) {
        info!(stored = user.should_be_stored, "user set");
        self.user = Some(user);
    }

    pub fn delete_user(&mut self) {
        if self.user.take().is_some() {
            info!("user deleted");
        }
    }
}
