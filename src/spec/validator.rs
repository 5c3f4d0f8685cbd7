//! Spec validation against a capability factory
//!
//! Structural validity lives on the spec types themselves. [`SpecValidator`]
//! layers the factory's runtime support on top, so "legal shape" and
//! "available here" can be checked separately. Nothing in this module returns
//! an error except [`SpecValidator::select_signature_spec`].

use std::sync::Arc;

use log::debug;

use super::keypair::{KeyPairSpec, KeyPairType};
use super::keyspec::KeySpec;
use super::length::Length;
use super::mac::{list_possible_macs, MacSpec};
use super::signature::{
    list_possible_signatures, list_possible_signatures_for_key_pair, SignatureSpec,
};
use crate::error::{KeyStoreError, KeyStoreResult};
use crate::factory::CapabilityFactory;

#[derive(Clone)]
pub struct SpecValidator {
    factory: Arc<dyn CapabilityFactory>,
}

impl SpecValidator {
    pub fn new(factory: Arc<dyn CapabilityFactory>) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &Arc<dyn CapabilityFactory> {
        &self.factory
    }

    pub fn is_valid_signature_spec(&self, spec: &SignatureSpec) -> bool {
        spec.is_valid()
    }

    /// Valid, and usable with a key pair of this spec per the factory's matcher
    pub fn is_valid_for_key_pair_spec(
        &self,
        key_pair: &KeyPairSpec,
        signature: &SignatureSpec,
    ) -> bool {
        signature.is_valid() && self.factory.key_pair_supports(key_pair, signature)
    }

    pub fn list_possible_signatures(&self, key_pair_type: KeyPairType) -> Vec<SignatureSpec> {
        list_possible_signatures(key_pair_type)
    }

    pub fn list_all_supported_signatures(&self, key_pair_type: KeyPairType) -> Vec<SignatureSpec> {
        list_possible_signatures(key_pair_type)
            .into_iter()
            .filter(|spec| self.factory.supports_signature_spec(spec))
            .collect()
    }

    pub fn list_possible_signatures_for_key_pair(
        &self,
        key_pair: &KeyPairSpec,
    ) -> Vec<SignatureSpec> {
        list_possible_signatures_for_key_pair(key_pair)
    }

    pub fn list_all_supported_signatures_for_key_pair(
        &self,
        key_pair: &KeyPairSpec,
    ) -> Vec<SignatureSpec> {
        list_possible_signatures_for_key_pair(key_pair)
            .into_iter()
            .filter(|spec| {
                self.factory.key_pair_supports(key_pair, spec)
                    && self.factory.supports_signature_spec(spec)
            })
            .collect()
    }

    /// Pick the signature spec a key pair should sign with.
    ///
    /// The key pair's default spec wins when the factory can run it; otherwise
    /// the first supported spec in listing order.
    pub fn select_signature_spec(&self, key_pair: &KeyPairSpec) -> KeyStoreResult<SignatureSpec> {
        if let Some(preferred) = SignatureSpec::default_for(key_pair) {
            if self.is_valid_for_key_pair_spec(key_pair, &preferred)
                && self.factory.supports_signature_spec(&preferred)
            {
                return Ok(preferred);
            }
        }
        let fallback = list_possible_signatures_for_key_pair(key_pair)
            .into_iter()
            .find(|spec| {
                self.factory.key_pair_supports(key_pair, spec)
                    && self.factory.supports_signature_spec(spec)
            });
        match fallback {
            Some(spec) => {
                debug!("Falling back to signature spec {} for {}", spec, key_pair);
                Ok(spec)
            }
            None => Err(KeyStoreError::unsupported_spec(
                key_pair,
                "no supported signature spec for key pair",
            )),
        }
    }

    pub fn is_supported_key_pair_spec(&self, key_pair: &KeyPairSpec) -> bool {
        key_pair.is_valid() && self.factory.supports_key_pair_spec(key_pair)
    }

    pub fn is_valid_mac_spec(&self, spec: &MacSpec) -> bool {
        spec.is_valid()
    }

    pub fn list_possible_macs(&self, key_length: Length) -> Vec<MacSpec> {
        list_possible_macs(key_length)
    }

    pub fn list_all_supported_macs(&self, key_length: Length) -> Vec<MacSpec> {
        list_possible_macs(key_length)
            .into_iter()
            .filter(|spec| self.factory.supports_mac_spec(spec))
            .collect()
    }

    pub fn is_supported_key_spec(&self, spec: &KeySpec) -> bool {
        spec.is_valid()
            && match spec {
                KeySpec::Symmetric(sym) => self.factory.supports_sym_key_spec(sym),
                KeySpec::Mac(mac) => self.factory.supports_mac_spec(mac),
            }
    }
}
