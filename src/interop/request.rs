//! Interop flow requests
//!
//! A request pairs a local invocation template with the remote views whose
//! payloads fill its placeholder slots. The view-to-argument mapping is
//! checked once, at construction.

use std::collections::{BTreeMap, HashSet};

use crate::interop::errors::InteropError;
use crate::interop::types::{Credentials, LocalInvocation, View, ViewAddressSpec};

#[derive(Debug, Clone)]
pub struct InteropFlowRequest {
    local_invocation: LocalInvocation,
    view_addresses: Vec<ViewAddressSpec>,
    /// view index -> argument index
    replace_indices: BTreeMap<usize, usize>,
    credentials: Credentials,
}

impl InteropFlowRequest {
    /// Validates that every view maps to exactly one existing argument slot
    /// and that no two views target the same slot.
    pub fn new(
        local_invocation: LocalInvocation,
        view_addresses: Vec<ViewAddressSpec>,
        replace_indices: BTreeMap<usize, usize>,
        credentials: Credentials,
    ) -> Result<Self, InteropError> {
        if replace_indices.len() != view_addresses.len() {
            return Err(InteropError::InvalidInput(format!(
                "{} views but {} replace indices",
                view_addresses.len(),
                replace_indices.len()
            )));
        }

        let mut targets = HashSet::new();
        for (&view_index, &arg_index) in &replace_indices {
            if view_index >= view_addresses.len() {
                return Err(InteropError::InvalidInput(format!(
                    "replace index refers to missing view {}",
                    view_index
                )));
            }
            if arg_index >= local_invocation.args.len() {
                return Err(InteropError::InvalidInput(format!(
                    "view {} targets argument {} but {} has {} arguments",
                    view_index,
                    arg_index,
                    local_invocation.function,
                    local_invocation.args.len()
                )));
            }
            if !targets.insert(arg_index) {
                return Err(InteropError::InvalidInput(format!(
                    "argument {} is targeted by more than one view",
                    arg_index
                )));
            }
        }

        for spec in &view_addresses {
            if spec.address.is_empty() {
                return Err(InteropError::InvalidInput("empty view address".to_string()));
            }
        }

        Ok(Self {
            local_invocation,
            view_addresses,
            replace_indices,
            credentials,
        })
    }

    /// A flow with no remote views: a plain local invocation
    pub fn local_only(local_invocation: LocalInvocation, credentials: Credentials) -> Self {
        Self {
            local_invocation,
            view_addresses: Vec::new(),
            replace_indices: BTreeMap::new(),
            credentials,
        }
    }

    pub fn local_invocation(&self) -> &LocalInvocation {
        &self.local_invocation
    }

    pub fn view_addresses(&self) -> &[ViewAddressSpec] {
        &self.view_addresses
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Fill placeholder slots with view payloads
    ///
    /// `views` must be in the same order as `view_addresses`; the result does
    /// not depend on the order the views were fetched in.
    pub fn substitute(&self, views: &[View]) -> Result<LocalInvocation, InteropError> {
        if views.len() != self.view_addresses.len() {
            return Err(InteropError::InvalidInput(format!(
                "{} views supplied for {} view addresses",
                views.len(),
                self.view_addresses.len()
            )));
        }

        let mut invocation = self.local_invocation.clone();
        for (&view_index, &arg_index) in &self.replace_indices {
            invocation.args[arg_index] = views[view_index].payload_base64();
        }
        Ok(invocation)
    }
}
