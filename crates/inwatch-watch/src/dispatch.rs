use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use inwatch_decoder::{ByteSource, DecoderConfig, Event, EventDecoder};
use inwatch_wire::EventMask;

use crate::error::WatchError;
use crate::registry::{WatchDescriptor, WatchRegistry};

/// Events the kernel delivers whether or not they were asked for.
const UNSOLICITED: EventMask = EventMask::from_raw(
    EventMask::IGNORED.raw() | EventMask::Q_OVERFLOW.raw() | EventMask::UNMOUNT.raw(),
);

/// Receives events for one subscription.
///
/// `path` is the path the subscription was registered on; for events
/// inside a watched directory, the entry name is in `event.name`.
pub trait EventListener {
    fn on_event(&mut self, path: &Path, event: &Event);
}

impl<F> EventListener for F
where
    F: FnMut(&Path, &Event),
{
    fn on_event(&mut self, path: &Path, event: &Event) {
        self(path, event);
    }
}

/// Handle returned by [`Dispatcher::subscribe`], used to cancel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Subscription {
    id: SubscriptionId,
    path: PathBuf,
    mask: EventMask,
    listener: Box<dyn EventListener>,
}

/// Routes decoded events to the listeners subscribed to their watch.
///
/// Several subscriptions may share one watch descriptor, either because
/// they name the same path or because the kernel resolved two paths to
/// the same inode. The kernel watch is removed only when the last of them
/// is cancelled.
///
/// ```text
///   source ──bytes──▶ EventDecoder ──Event{wd}──▶ subscriptions[wd] ──▶ listeners
/// ```
///
/// Each listener sees the events matching its own mask plus the events
/// the kernel always sends (`IGNORED`, `Q_OVERFLOW`, `UNMOUNT`). Masks are
/// passed to the kernel exactly as given: subscribing the same path twice
/// with different masks replaces the kernel-side mask unless the second
/// mask carries `MASK_ADD`.
pub struct Dispatcher<S> {
    decoder: EventDecoder<S>,
    subscriptions: BTreeMap<WatchDescriptor, Vec<Subscription>>,
    next_id: u64,
}

impl<S: ByteSource + WatchRegistry> Dispatcher<S> {
    /// Wrap a source that is also a watch registry.
    ///
    /// # Errors
    ///
    /// [`WatchError::Decode`] if the decoder configuration is invalid.
    pub fn with_source(source: S, config: DecoderConfig) -> Result<Self, WatchError> {
        Ok(Self {
            decoder: EventDecoder::with_config(source, config)?,
            subscriptions: BTreeMap::new(),
            next_id: 0,
        })
    }

    /// Register `listener` for the events in `mask` on `path`.
    ///
    /// # Errors
    ///
    /// Whatever the registry reports for `add_watch`.
    pub fn subscribe(
        &mut self,
        path: impl AsRef<Path>,
        mask: EventMask,
        listener: impl EventListener + 'static,
    ) -> Result<SubscriptionId, WatchError> {
        let path = path.as_ref();
        let wd = self.decoder.source_mut().add_watch(path, mask)?;

        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        tracing::debug!(%id, %wd, path = %path.display(), %mask, "subscribed");
        self.subscriptions.entry(wd).or_default().push(Subscription {
            id,
            path: path.to_path_buf(),
            mask,
            listener: Box::new(listener),
        });
        Ok(id)
    }

    /// Cancel a subscription, removing its kernel watch if no other
    /// subscription shares it.
    ///
    /// # Errors
    ///
    /// - [`WatchError::AlreadyCancelled`] if `id` was cancelled before, or
    ///   its watch went away (`IGNORED`).
    /// - [`WatchError::UnknownSubscription`] if `id` was never issued here.
    /// - [`WatchError::RemoveWatch`] if the kernel rejects the removal.
    pub fn cancel(&mut self, id: SubscriptionId) -> Result<(), WatchError> {
        let found = self.subscriptions.iter_mut().find_map(|(wd, subs)| {
            subs.iter().position(|s| s.id == id).map(|pos| (*wd, subs, pos))
        });

        let Some((wd, subs, pos)) = found else {
            return Err(if id.0 < self.next_id {
                WatchError::AlreadyCancelled { id }
            } else {
                WatchError::UnknownSubscription { id }
            });
        };

        subs.remove(pos);
        let last = subs.is_empty();
        tracing::debug!(%id, %wd, last, "cancelled subscription");

        if last {
            self.subscriptions.remove(&wd);
            self.decoder.source_mut().rm_watch(wd)?;
        }
        Ok(())
    }

    /// Decode one event and deliver it.
    ///
    /// Returns `Ok(false)` once the source reaches end of stream.
    ///
    /// # Errors
    ///
    /// [`WatchError::Decode`] if the event stream fails.
    pub fn dispatch_next(&mut self) -> Result<bool, WatchError> {
        let Some(event) = self.decoder.next_event()? else {
            return Ok(false);
        };
        let wd = WatchDescriptor::from_raw(event.wd);

        if event.mask.is_overflow() {
            tracing::warn!("inotify queue overflowed, events were dropped");
            for sub in self.subscriptions.values_mut().flatten() {
                sub.listener.on_event(&sub.path, &event);
            }
            return Ok(true);
        }

        match self.subscriptions.get_mut(&wd) {
            Some(subs) => {
                for sub in subs.iter_mut() {
                    if event.mask.intersects(sub.mask | UNSOLICITED) {
                        sub.listener.on_event(&sub.path, &event);
                    }
                }
            }
            None => tracing::debug!(%wd, mask = %event.mask, "event for unknown watch"),
        }

        if event.mask.is_ignored() && self.subscriptions.remove(&wd).is_some() {
            tracing::debug!(%wd, "watch removed by kernel");
        }
        Ok(true)
    }

    /// Dispatch events until end of stream.
    ///
    /// # Errors
    ///
    /// [`WatchError::Decode`] if the event stream fails.
    pub fn run(&mut self) -> Result<(), WatchError> {
        while self.dispatch_next()? {}
        Ok(())
    }
}

impl<S> Dispatcher<S> {
    /// Number of live subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.values().map(Vec::len).sum()
    }

    /// Number of distinct kernel watches in use.
    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Path a live subscription was registered on.
    #[must_use]
    pub fn path_of(&self, id: SubscriptionId) -> Option<&Path> {
        self.subscriptions
            .values()
            .flatten()
            .find(|s| s.id == id)
            .map(|s| s.path.as_path())
    }

    pub fn decoder(&self) -> &EventDecoder<S> {
        &self.decoder
    }

    pub fn source(&self) -> &S {
        self.decoder.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::{self, Read};
    use std::rc::Rc;

    use inwatch_wire::encode_record;

    /// Registry + byte source with no kernel behind it.
    #[derive(Default)]
    struct FakeKernel {
        stream: io::Cursor<Vec<u8>>,
        wds: HashMap<PathBuf, i32>,
        removed: Vec<i32>,
    }

    impl FakeKernel {
        fn with_stream(records: &[Vec<u8>]) -> Self {
            Self {
                stream: io::Cursor::new(records.concat()),
                ..Self::default()
            }
        }
    }

    impl Read for FakeKernel {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.stream.read(buf)
        }
    }

    impl WatchRegistry for FakeKernel {
        fn add_watch(&mut self, path: &Path, _mask: EventMask) -> Result<WatchDescriptor, WatchError> {
            let next = i32::try_from(self.wds.len()).unwrap() + 1;
            let wd = *self.wds.entry(path.to_path_buf()).or_insert(next);
            Ok(WatchDescriptor::from_raw(wd))
        }

        fn rm_watch(&mut self, wd: WatchDescriptor) -> Result<(), WatchError> {
            self.removed.push(wd.raw());
            Ok(())
        }
    }

    type Log = Rc<RefCell<Vec<(String, PathBuf, Option<String>)>>>;

    fn recorder(tag: &str, log: &Log) -> impl EventListener + 'static {
        let tag = tag.to_string();
        let log = Rc::clone(log);
        move |path: &Path, event: &Event| {
            log.borrow_mut()
                .push((tag.clone(), path.to_path_buf(), event.name.clone()));
        }
    }

    fn dispatcher(records: &[Vec<u8>]) -> Dispatcher<FakeKernel> {
        Dispatcher::with_source(FakeKernel::with_stream(records), DecoderConfig::default()).unwrap()
    }

    #[test]
    fn delivers_to_every_subscription_on_a_watch() {
        let records = [encode_record(1, EventMask::CREATE, 0, Some("a.txt")).unwrap()];
        let mut d = dispatcher(&records);
        let log = Log::default();
        d.subscribe("/tmp", EventMask::CREATE, recorder("first", &log)).unwrap();
        d.subscribe("/tmp", EventMask::CREATE, recorder("second", &log)).unwrap();
        assert_eq!(d.watch_count(), 1);

        d.run().unwrap();
        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].0, "first");
        assert_eq!(log[1].0, "second");
        assert_eq!(log[0].1, PathBuf::from("/tmp"));
        assert_eq!(log[0].2.as_deref(), Some("a.txt"));
    }

    #[test]
    fn routes_by_watch_descriptor() {
        let records = [
            encode_record(2, EventMask::DELETE, 0, Some("gone")).unwrap(),
            encode_record(1, EventMask::CREATE, 0, Some("new")).unwrap(),
        ];
        let mut d = dispatcher(&records);
        let log = Log::default();
        d.subscribe("/a", EventMask::ALL_EVENTS, recorder("a", &log)).unwrap();
        d.subscribe("/b", EventMask::ALL_EVENTS, recorder("b", &log)).unwrap();

        d.run().unwrap();
        let tags: Vec<_> = log.borrow().iter().map(|e| e.0.clone()).collect();
        assert_eq!(tags, vec!["b", "a"]);
    }

    #[test]
    fn filters_by_subscription_mask() {
        let records = [encode_record(1, EventMask::MODIFY, 0, Some("f")).unwrap()];
        let mut d = dispatcher(&records);
        let log = Log::default();
        d.subscribe("/tmp", EventMask::CREATE, recorder("create", &log)).unwrap();
        d.subscribe("/tmp", EventMask::MODIFY, recorder("modify", &log)).unwrap();

        d.run().unwrap();
        let tags: Vec<_> = log.borrow().iter().map(|e| e.0.clone()).collect();
        assert_eq!(tags, vec!["modify"]);
    }

    #[test]
    fn kernel_watch_removed_with_last_subscription() {
        let mut d = dispatcher(&[]);
        let log = Log::default();
        let first = d.subscribe("/tmp", EventMask::CREATE, recorder("1", &log)).unwrap();
        let second = d.subscribe("/tmp", EventMask::DELETE, recorder("2", &log)).unwrap();

        d.cancel(first).unwrap();
        assert!(d.source().removed.is_empty());
        assert_eq!(d.subscription_count(), 1);

        d.cancel(second).unwrap();
        assert_eq!(d.source().removed, vec![1]);
        assert_eq!(d.watch_count(), 0);
    }

    #[test]
    fn double_cancel_is_reported() {
        let mut d = dispatcher(&[]);
        let id = d.subscribe("/tmp", EventMask::CREATE, |_: &Path, _: &Event| {}).unwrap();
        d.cancel(id).unwrap();
        assert!(matches!(d.cancel(id), Err(WatchError::AlreadyCancelled { .. })));
        assert!(matches!(
            d.cancel(SubscriptionId(99)),
            Err(WatchError::UnknownSubscription { .. })
        ));
    }

    #[test]
    fn ignored_drops_subscriptions_after_delivery() {
        let records = [encode_record(1, EventMask::IGNORED, 0, None).unwrap()];
        let mut d = dispatcher(&records);
        let log = Log::default();
        let id = d.subscribe("/tmp", EventMask::CREATE, recorder("x", &log)).unwrap();

        assert!(d.dispatch_next().unwrap());
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(d.subscription_count(), 0);
        assert!(d.path_of(id).is_none());
        assert!(matches!(d.cancel(id), Err(WatchError::AlreadyCancelled { .. })));
        assert!(!d.dispatch_next().unwrap());
    }

    #[test]
    fn overflow_reaches_every_listener() {
        let records = [encode_record(-1, EventMask::Q_OVERFLOW, 0, None).unwrap()];
        let mut d = dispatcher(&records);
        let log = Log::default();
        d.subscribe("/a", EventMask::CREATE, recorder("a", &log)).unwrap();
        d.subscribe("/b", EventMask::DELETE, recorder("b", &log)).unwrap();

        d.run().unwrap();
        assert_eq!(log.borrow().len(), 2);
    }
}
