// Global logging system for the boot stage

use spin::Mutex;

const MAX_LOG_ENTRIES: usize = 64;

struct LogBuffer {
    entries: [Option<&'static str>; MAX_LOG_ENTRIES],
    count: usize,
}

static LOG: Mutex<LogBuffer> = Mutex::new(LogBuffer {
    entries: [None; MAX_LOG_ENTRIES],
    count: 0,
});

pub fn log(message: &'static str) {
    let mut buffer = LOG.lock();
    let index = buffer.count;
    if index < MAX_LOG_ENTRIES {
        buffer.entries[index] = Some(message);
    }
    buffer.count += 1;
}

/// Total messages logged, including any dropped past capacity.
pub fn log_count() -> usize {
    LOG.lock().count
}

/// Visit the retained log messages in order.
pub fn for_each_log(mut visit: impl FnMut(&'static str)) {
    let buffer = LOG.lock();
    let retained = buffer.count.min(MAX_LOG_ENTRIES);
    for entry in buffer.entries[..retained].iter() {
        if let Some(message) = *entry {
            visit(message);
        }
    }
}

// Macro for easier logging
#[macro_export]
macro_rules! log_info {
    ($msg:expr) => {
        $crate::logger::log($msg)
    };
}
