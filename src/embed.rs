//! Mounting widgets into host page containers
//!
//! An [`EmbedHost`] stands for a host page: it knows which container ids
//! exist and which of them already hold a widget. Mounting returns a
//! [`WidgetHandle`]; unmounting it (or dropping it) shuts the widget down and
//! frees the container. There is no global registry, each host page owns its
//! own `EmbedHost`.
//!
//! # Examples
//!
//! ```no_run
//! use museum_chat::{ChannelCheckout, ChatWidget, EmbedHost};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = EmbedHost::new();
//!     host.register_container("museum-chat").await;
//!
//!     let (checkout, _overlays) = ChannelCheckout::new();
//!     let handle = host
//!         .mount("museum-chat", ChatWidget::builder().checkout(Box::new(checkout)))
//!         .await?;
//!
//!     handle.widget().toggle().await;
//!     handle.unmount().await;
//!     Ok(())
//! }
//! ```

use crate::error::{Result, WidgetError};
use crate::types::WidgetId;
use crate::widget::{ChatWidget, ChatWidgetBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Container id → mounted widget, if any
type Containers = Arc<RwLock<HashMap<String, Option<WidgetId>>>>;

/// A host page's mountable containers
#[derive(Debug, Clone, Default)]
pub struct EmbedHost {
    containers: Containers,
}

impl EmbedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a container available for mounting
    pub async fn register_container(&self, container_id: impl Into<String>) {
        let container_id = container_id.into();
        debug!(container_id = %container_id, "Container registered");
        self.containers
            .write()
            .await
            .entry(container_id)
            .or_insert(None);
    }

    /// Remove a container; a widget still mounted there keeps running
    pub async fn remove_container(&self, container_id: &str) -> bool {
        self.containers.write().await.remove(container_id).is_some()
    }

    /// Widget currently mounted in a container
    pub async fn mounted(&self, container_id: &str) -> Option<WidgetId> {
        self.containers
            .read()
            .await
            .get(container_id)
            .copied()
            .flatten()
    }

    pub async fn len(&self) -> usize {
        self.containers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.containers.read().await.is_empty()
    }

    /// Build a widget and bind it to `container_id`
    pub async fn mount(&self, container_id: &str, builder: ChatWidgetBuilder) -> Result<WidgetHandle> {
        let mut containers = self.containers.write().await;
        let slot = containers
            .get_mut(container_id)
            .ok_or_else(|| WidgetError::ContainerNotFound(container_id.to_string()))?;
        if slot.is_some() {
            return Err(WidgetError::AlreadyMounted(container_id.to_string()));
        }

        let widget = builder.build()?;
        *slot = Some(widget.id());
        info!(container_id, widget_id = %widget.id(), "Widget mounted");

        Ok(WidgetHandle {
            container_id: container_id.to_string(),
            widget: Arc::new(widget),
            containers: self.containers.clone(),
            released: false,
        })
    }
}

/// A mounted widget; dispose with [`unmount`](WidgetHandle::unmount)
#[derive(Debug)]
pub struct WidgetHandle {
    container_id: String,
    widget: Arc<ChatWidget>,
    containers: Containers,
    released: bool,
}

impl WidgetHandle {
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn widget(&self) -> &ChatWidget {
        &self.widget
    }

    /// Shared reference for tasks that outlive a borrow of the handle
    pub fn widget_arc(&self) -> Arc<ChatWidget> {
        self.widget.clone()
    }

    /// Shut the widget down and free its container
    pub async fn unmount(mut self) {
        self.widget.shutdown();
        Self::release(&mut *self.containers.write().await, &self.container_id, self.widget.id());
        self.released = true;
        info!(container_id = %self.container_id, "Widget unmounted");
    }

    fn release(containers: &mut HashMap<String, Option<WidgetId>>, container_id: &str, id: WidgetId) {
        if let Some(slot) = containers.get_mut(container_id) {
            if *slot == Some(id) {
                *slot = None;
            }
        }
    }
}

impl Drop for WidgetHandle {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.widget.shutdown();
        match self.containers.try_write() {
            Ok(mut containers) => {
                Self::release(&mut containers, &self.container_id, self.widget.id());
            }
            Err(_) => warn!(
                container_id = %self.container_id,
                "Container busy while dropping widget handle; call unmount() to free it"
            ),
        }
    }
}
