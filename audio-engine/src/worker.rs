//! The single cooperative mixing thread. Owns no voice state exclusively;
//! each of the three voice lists is protected by its own `parking_lot`
//! mutex, acquired one at a time. The thread is named `"audio-mixer"` so
//! panics and logs are attributable, and each voice's `mix()` call is
//! wrapped in `catch_unwind` so one panicking voice cannot stop the
//! worker from servicing the others.

use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::slots::SlotList;
use crate::voice::StreamingVoice;

const IDLE_SLEEP: Duration = Duration::from_millis(10);

pub struct VoiceLists {
    pub panning: Mutex<SlotList<StreamingVoice>>,
    pub spatial: Mutex<SlotList<StreamingVoice>>,
    pub streams: Mutex<SlotList<StreamingVoice>>,
}

impl VoiceLists {
    pub fn new() -> Arc<Self> {
        Arc::new(VoiceLists {
            panning: Mutex::new(SlotList::new()),
            spatial: Mutex::new(SlotList::new()),
            streams: Mutex::new(SlotList::new()),
        })
    }
}

/// The worker's wakeup condition variable, guarded by a dirty flag so
/// notifications that arrive before `wait` is reached are not lost.
pub struct Wakeup {
    flag: Mutex<bool>,
    cv: Condvar,
}

impl Wakeup {
    pub fn new() -> Arc<Self> {
        Arc::new(Wakeup {
            flag: Mutex::new(false),
            cv: Condvar::new(),
        })
    }

    pub fn notify(&self) {
        let mut flag = self.flag.lock();
        *flag = true;
        self.cv.notify_one();
    }

    fn wait(&self) {
        let mut flag = self.flag.lock();
        if !*flag {
            self.cv.wait(&mut flag);
        }
        *flag = false;
    }
}

pub struct MixerWorker {
    stop: Arc<AtomicBool>,
    wakeup: Arc<Wakeup>,
    handle: Option<thread::JoinHandle<()>>,
}

impl MixerWorker {
    pub fn spawn(lists: Arc<VoiceLists>, wakeup: Arc<Wakeup>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_for_thread = stop.clone();
        let wakeup_for_thread = wakeup.clone();
        let handle = thread::Builder::new()
            .name("audio-mixer".to_string())
            .spawn(move || run(lists, wakeup_for_thread, stop_for_thread))
            .expect("failed to spawn audio-mixer thread");

        MixerWorker {
            stop,
            wakeup,
            handle: Some(handle),
        }
    }

    /// Signals the worker to exit after its current pass and joins the
    /// thread. Bounded by the worker's own 10 ms idle sleep at worst.
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.wakeup.notify();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run(lists: Arc<VoiceLists>, wakeup: Arc<Wakeup>, stop: Arc<AtomicBool>) {
    tracing::debug!("audio-mixer thread started");
    loop {
        if stop.load(Ordering::SeqCst) {
            break;
        }

        let mut any_playing = false;
        let mut advanced_any = false;

        {
            let mut list = lists.panning.lock();
            mix_list(&mut list, &mut any_playing, &mut advanced_any);
        }
        {
            let mut list = lists.spatial.lock();
            mix_list(&mut list, &mut any_playing, &mut advanced_any);
        }
        {
            let mut list = lists.streams.lock();
            mix_list(&mut list, &mut any_playing, &mut advanced_any);
        }

        if stop.load(Ordering::SeqCst) {
            break;
        }

        if !any_playing {
            wakeup.wait();
        } else if !advanced_any {
            thread::sleep(IDLE_SLEEP);
        }
    }
    tracing::debug!("audio-mixer thread exiting");
}

fn mix_list(list: &mut SlotList<StreamingVoice>, any_playing: &mut bool, advanced_any: &mut bool) {
    for voice in list.iter_mut() {
        if voice.is_playing() {
            *any_playing = true;
        }
        match panic::catch_unwind(panic::AssertUnwindSafe(|| voice.mix())) {
            Ok(advanced) => {
                if advanced {
                    *advanced_any = true;
                }
            }
            Err(_) => {
                tracing::error!("voice mix() panicked; marking voice failed");
                voice.mark_failed();
            }
        }
    }
}
