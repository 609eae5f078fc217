// Component registry
use crate::{EventBus, EventHandler, HeraldError, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// A bus participant: handles the events it names and releases its
/// resources on shutdown.
pub trait Component: EventHandler {
    fn name(&self) -> &str;

    /// Event names this component subscribes to.
    fn topics(&self) -> &[&'static str];

    fn shutdown(&self) -> Result<()>;
}

struct Registration {
    component: Arc<dyn Component>,
    subscriptions: Vec<String>,
}

/// Core runtime: owns the bus and the components attached to it.
pub struct Herald {
    pub event_bus: Arc<EventBus>,
    components: DashMap<String, Registration>,
}

impl Herald {
    pub fn new() -> Self {
        Self::with_bus(Arc::new(EventBus::new()))
    }

    pub fn with_bus(event_bus: Arc<EventBus>) -> Self {
        Self {
            event_bus,
            components: DashMap::new(),
        }
    }

    /// Subscribe `component` to each of its topics.
    pub fn register<C>(&self, component: Arc<C>) -> Result<()>
    where
        C: Component + 'static,
    {
        let name = component.name().to_string();
        // The entry guard is held while subscribing, so a concurrent register
        // of the same name sees Occupied.
        match self.components.entry(name.clone()) {
            Entry::Occupied(_) => {
                return Err(HeraldError::ComponentError(format!(
                    "Component {} already registered",
                    name
                )));
            }
            Entry::Vacant(vacant) => {
                let subscriptions = component
                    .topics()
                    .iter()
                    .map(|topic| {
                        let handler: Arc<dyn EventHandler> = component.clone();
                        self.event_bus.subscribe(*topic, handler)
                    })
                    .collect();
                vacant.insert(Registration {
                    component,
                    subscriptions,
                });
            }
        }
        info!("Registered component: {}", name);
        Ok(())
    }

    /// Detach a component from the bus and shut it down.
    pub fn unregister(&self, name: &str) -> Result<()> {
        let (_, reg) = self.components.remove(name).ok_or_else(|| {
            HeraldError::ComponentError(format!("Component {} not found", name))
        })?;
        for id in &reg.subscriptions {
            self.event_bus.unsubscribe(id);
        }
        reg.component.shutdown()
    }

    pub fn component_names(&self) -> Vec<String> {
        self.components.iter().map(|e| e.key().clone()).collect()
    }

    pub fn shutdown(&self) -> Result<()> {
        info!("Shutting down Herald...");

        let names = self.component_names();
        for name in names {
            if let Err(e) = self.unregister(&name) {
                warn!("Error shutting down component {}: {}", name, e);
            }
        }
        self.event_bus.shutdown();

        info!("Herald shut down successfully");
        Ok(())
    }
}

impl Default for Herald {
    fn default() -> Self {
        Self::new()
    }
}
