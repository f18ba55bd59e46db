// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide registry of service-bus connections.
//!
//! Connections are created once per system name through a registered
//! transport factory and shared by every `System` instance (and its
//! proxies) using that name. The registry holds connections weakly so
//! dropping the last user tears the connection down.

use crate::access::ServiceBus;
use crate::error::BusError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};

/// Environment variable naming the components-registry manifest a
/// transport implementation may load its plugin from. The registry
/// only reports it in errors; interpreting the manifest is up to the
/// registered factory.
pub const COMPONENTS_FILE_ENV: &str = "CONVOY_COMPONENTS_FILE_PATH";

/// Factory producing a bus connection for `(system_name, url)`.
pub type BusFactory =
    Arc<dyn Fn(&str, &str) -> Result<Arc<dyn ServiceBus>, BusError> + Send + Sync>;

struct Registry {
    factory: Mutex<Option<BusFactory>>,
    connections: Mutex<HashMap<String, Weak<dyn ServiceBus>>>,
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Registry {
        factory: Mutex::new(None),
        connections: Mutex::new(HashMap::new()),
    })
}

/// Install the transport factory used by all subsequent [`connect`]
/// calls. Replaces any previously registered factory.
pub fn register_transport(factory: BusFactory) {
    *registry().factory.lock() = Some(factory);
}

/// Create or reuse the bus connection for `system_name`.
pub fn connect(system_name: &str, url: &str) -> Result<Arc<dyn ServiceBus>, BusError> {
    let reg = registry();

    let mut connections = reg.connections.lock();
    if let Some(existing) = connections.get(system_name).and_then(Weak::upgrade) {
        return Ok(existing);
    }

    let factory = reg.factory.lock().clone().ok_or(BusError::NoTransport)?;
    let connection = factory(system_name, url)?;
    tracing::debug!(system = system_name, url, "created service bus connection");
    connections.insert(system_name.to_string(), Arc::downgrade(&connection));
    Ok(connection)
}
