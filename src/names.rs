//! Property-name translation between internal and external conventions.
//!
//! The resolver is an opaque collaborator supplied by the caller: the
//! orchestrator asks it for the external key of every internal property name
//! and never inspects the answer.

/// Maps an internal property name to the external key used in the input
/// record. Stateless per call.
pub trait NameResolver: Sync {
    fn resolve(&self, internal: &str) -> String;
}

/// External keys equal internal names.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNames;

impl NameResolver for IdentityNames {
    fn resolve(&self, internal: &str) -> String {
        internal.to_string()
    }
}

/// camelCase internal names, snake_case external keys
/// (`accountingFirmId` → `accounting_firm_id`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeCaseNames;

impl NameResolver for SnakeCaseNames {
    fn resolve(&self, internal: &str) -> String {
        let mut out = String::with_capacity(internal.len() + 4);
        for (i, ch) in internal.chars().enumerate() {
            if ch.is_ascii_uppercase() {
                if i > 0 {
                    out.push('_');
                }
                out.push(ch.to_ascii_lowercase());
            } else {
                out.push(ch);
            }
        }
        out
    }
}

// ------------------------------- Tests ------------------------------------ //
