//! Releases what the previous view left in the response store.
//!
//! Only names declared by the previous view's requests are removed. For
//! content-backed requests, the symbols their loader info registered are
//! dropped from the symbol index as well.

use log::debug;

use crate::core::state::AppState;

/// Removes `name`'s responses (and their indexed symbols). Returns how many
/// responses were removed.
pub fn remove_response(state: &AppState, name: &str) -> usize {
    let Some(route) = state.config.route(name) else {
        return 0;
    };

    let parser = state.parser();
    let mut removed = 0;
    for descriptor in &route.requests {
        let Some(key) = descriptor.name().map(|n| parser.execute(n)) else {
            continue;
        };

        let Some(payload) = state.response.remove(&key) else {
            continue;
        };
        removed += 1;

        if descriptor.registers_symbols()
            && let Some(content) = payload.as_content()
        {
            for symbol in content.loader_info.symbol_keys() {
                state.symbols.remove(symbol);
            }
        }
    }

    debug!("Removed {} response(s) of '{}'", removed, name);
    removed
}
