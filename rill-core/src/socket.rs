//! Sockets: FIFO connections between one producer and one consumer.
//!
//! A socket owns its queue and its observers; there is no shared event
//! bus. The producer side is an out-port (or any external driver calling
//! [`Socket::post`]); the consumer side is either an in-port, fed by a
//! small delivery task, or an external reader calling [`Socket::take`].

use crate::component::Component;
use crate::error::{PortError, SocketError};
use crate::id::PortName;
use crate::ip::Ip;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

static NEXT_SOCKET_ID: AtomicU64 = AtomicU64::new(1);

/// Notifications raised by a socket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SocketEvent<'a> {
    /// A producer or consumer port was attached.
    Attached,
    /// A packet entered the queue.
    Delivered(&'a Ip),
    /// The socket was detached from both ends.
    Detached,
}

/// Callback registered with [`Socket::on_event`].
pub type SocketObserver = Arc<dyn Fn(SocketEvent<'_>) + Send + Sync>;

struct Producer {
    component: Weak<dyn Component>,
    port: PortName,
}

struct Consumer {
    port: PortName,
    delivery: JoinHandle<()>,
}

#[derive(Default)]
struct State {
    queue: VecDeque<Ip>,
    producer: Option<Producer>,
    consumer: Option<Consumer>,
    observers: Vec<SocketObserver>,
    closed: bool,
}

struct Inner {
    id: u64,
    state: Mutex<State>,
    ready: Arc<Notify>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Wakes a parked delivery task so it sees the socket is gone.
        self.ready.notify_one();
    }
}

/// An ordered, single-producer single-consumer packet connection.
///
/// Cloning yields another handle to the same socket.
#[derive(Clone)]
pub struct Socket {
    inner: Arc<Inner>,
}

impl Socket {
    /// Create an unattached socket.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                id: NEXT_SOCKET_ID.fetch_add(1, Ordering::Relaxed),
                state: Mutex::new(State::default()),
                ready: Arc::new(Notify::new()),
            }),
        }
    }

    /// Create a socket and wire `source.out_port` to `dest.in_port`.
    pub fn connect(
        source: &Arc<dyn Component>,
        out_port: &str,
        dest: &Arc<dyn Component>,
        in_port: &str,
    ) -> Result<Self, SocketError> {
        let socket = Self::new();
        socket.attach_out(source, out_port)?;
        if let Err(e) = socket.attach_in(dest, in_port) {
            socket.detach();
            return Err(e);
        }
        Ok(socket)
    }

    /// Process-unique identifier of this socket.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Whether two handles refer to the same socket.
    pub fn same_as(&self, other: &Socket) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Observers run outside the lock, so a poisoned lock only means a
        // panic between two queue operations; the queue itself is intact.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Pop the next packet. `Err` once the socket is detached and drained.
    fn pop(&self) -> Result<Option<Ip>, ()> {
        let mut state = self.lock();
        match state.queue.pop_front() {
            Some(ip) => Ok(Some(ip)),
            None if state.closed => Err(()),
            None => Ok(None),
        }
    }

    /// Append a packet. Packets posted after [`Socket::detach`] are dropped.
    pub fn post(&self, ip: Ip) {
        let observers = {
            let mut state = self.lock();
            if state.closed {
                tracing::trace!(socket = self.id(), kind = %ip.kind(), "post on detached socket dropped");
                return;
            }
            tracing::trace!(socket = self.id(), kind = %ip.kind(), "socket delivery");
            state.queue.push_back(ip.clone());
            state.observers.clone()
        };
        self.inner.ready.notify_one();
        for observer in &observers {
            observer(SocketEvent::Delivered(&ip));
        }
    }

    /// Wait for the next packet. Returns `None` once the socket is detached
    /// and its queue drained.
    pub async fn take(&self) -> Option<Ip> {
        loop {
            match self.pop() {
                Ok(Some(ip)) => return Some(ip),
                Ok(None) => self.inner.ready.notified().await,
                Err(()) => return None,
            }
        }
    }

    /// Take the next packet if one is queued.
    pub fn try_take(&self) -> Option<Ip> {
        self.lock().queue.pop_front()
    }

    /// Number of queued packets.
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the socket was detached.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Whether an out-port is attached as producer.
    pub fn has_producer(&self) -> bool {
        self.lock().producer.is_some()
    }

    /// Whether an in-port is attached as consumer.
    pub fn has_consumer(&self) -> bool {
        self.lock().consumer.is_some()
    }

    /// Register an observer for attach, delivery and detach notifications.
    pub fn on_event<F>(&self, observer: F)
    where
        F: Fn(SocketEvent<'_>) + Send + Sync + 'static,
    {
        self.lock().observers.push(Arc::new(observer));
    }

    fn notify(&self, event: SocketEvent<'_>) {
        let observers = self.lock().observers.clone();
        for observer in &observers {
            observer(event);
        }
    }

    /// Make `port` of `component` the producer of this socket.
    pub fn attach_out(&self, component: &Arc<dyn Component>, port: &str) -> Result<(), SocketError> {
        {
            let mut state = self.lock();
            if state.producer.is_some() {
                return Err(SocketError::ProducerAttached);
            }
            state.producer = Some(Producer {
                component: Arc::downgrade(component),
                port: PortName::new(port),
            });
        }
        if let Err(e) = component.attach_out(port, self.clone()) {
            self.lock().producer = None;
            return Err(e.into());
        }
        self.notify(SocketEvent::Attached);
        Ok(())
    }

    /// Make `port` of `component` the consumer of this socket.
    ///
    /// A delivery task moves packets from the queue into the component in
    /// FIFO order. It holds both the socket and the component weakly and
    /// ends when either is dropped, or when the socket is detached and
    /// drained.
    pub fn attach_in(&self, component: &Arc<dyn Component>, port: &str) -> Result<(), SocketError> {
        if component.descriptor().in_port(port).is_none() {
            return Err(PortError::UnknownInPort(PortName::new(port)).into());
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SocketError::NoRuntime)?;
        let mut state = self.lock();
        if state.consumer.is_some() {
            return Err(SocketError::ConsumerAttached);
        }
        let port = PortName::new(port);
        let target = Arc::downgrade(component);
        let source = Arc::downgrade(&self.inner);
        let ready = Arc::clone(&self.inner.ready);
        let id = self.id();
        let in_port = port.clone();
        let delivery = runtime.spawn(async move {
            loop {
                let Some(inner) = source.upgrade() else {
                    break;
                };
                let next = Socket { inner }.pop();
                match next {
                    Ok(Some(ip)) => {
                        let Some(component) = target.upgrade() else {
                            break;
                        };
                        if let Err(e) = component.post(in_port.as_str(), ip) {
                            tracing::debug!(socket = id, port = %in_port, error = %e, "delivery refused");
                        }
                    }
                    // A permit stored by post or by the last handle's drop
                    // makes this return at once.
                    Ok(None) => ready.notified().await,
                    Err(()) => break,
                }
            }
            tracing::trace!(socket = id, port = %in_port, "delivery ended");
        });
        state.consumer = Some(Consumer { port, delivery });
        drop(state);
        self.notify(SocketEvent::Attached);
        Ok(())
    }

    /// Disconnect both ends.
    ///
    /// Packets already queued are still delivered to an attached in-port;
    /// later posts are dropped.
    pub fn detach(&self) {
        let (producer, consumer) = {
            let mut state = self.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            (state.producer.take(), state.consumer.take())
        };
        self.inner.ready.notify_one();
        if let Some(producer) = producer {
            if let Some(component) = producer.component.upgrade() {
                component.detach_out(producer.port.as_str(), self);
            }
        }
        if let Some(consumer) = consumer {
            tracing::trace!(socket = self.id(), port = %consumer.port, "consumer detached");
            // The delivery task drains the queue and exits on its own.
            drop(consumer.delivery);
        }
        self.notify(SocketEvent::Detached);
    }
}

impl Default for Socket {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Socket")
            .field("id", &self.inner.id)
            .field("queued", &state.queue.len())
            .field("closed", &state.closed)
            .finish()
    }
}
