//! # Shared Event-Type Contract (Trace Producer ↔ Viewer)
//!
//! Defines the event kinds, render attributes and sequence terminators that
//! the native tracing code and the viewer agree on. The numeric codes are a
//! strict external contract: any renumbering on the producer side requires a
//! matching update here.
//!
//! ## Key Types
//!
//! - [`EventKind`] - Every event kind the producer may emit, with its code
//! - [`EventAttributes`] - Color, label and marker geometry for a kind
//! - [`Rgb`] - Plain 24-bit color shared by all render backends
//!
//! ## Ranges
//!
//! Series filter by an inclusive `[min, max]` code range. The `*_RANGE`
//! constants name the ranges the viewer uses for its channels.

#![cfg_attr(not(test), no_std)]

use core::fmt;

// ============================================================================
// Colors
// ============================================================================

/// 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rrggbb` at compile time. Panics on malformed input, which only
    /// ever happens in the constant tables below.
    #[must_use]
    pub const fn hex(s: &str) -> Self {
        let b = s.as_bytes();
        assert!(b.len() == 7 && b[0] == b'#', "color must be #rrggbb");
        Rgb(
            hex_byte(b[1], b[2]),
            hex_byte(b[3], b[4]),
            hex_byte(b[5], b[6]),
        )
    }
}

const fn hex_digit(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => panic!("invalid hex digit"),
    }
}

const fn hex_byte(hi: u8, lo: u8) -> u8 {
    hex_digit(hi) * 16 + hex_digit(lo)
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Sentinel color for kinds that end a sequence. Spans are never painted in it.
pub const UNUSED_COLOR: Rgb = Rgb::hex("#000000");

// ============================================================================
// Type Ranges
// ============================================================================

/// CPU activity: `IdleIn` / `IdleOut`
pub const CPU_RANGE: (u32, u32) = (0, 1);
/// Android app side buffer queue
pub const BUFFER_QUEUE_RANGE: (u32, u32) = (100, 106);
/// Chrome side: Exo surface, barrier and ChromeOS composition
pub const CHROME_RANGE: (u32, u32) = (200, 505);
/// Android SurfaceFlinger
pub const SURFACE_FLINGER_RANGE: (u32, u32) = (400, 405);
/// Vsync only
pub const VSYNC_RANGE: (u32, u32) = (400, 400);
/// Android global marks other than vsync: composition jank and custom events
pub const GLOBAL_MARK_RANGE: (u32, u32) = (401, 600);
/// Every mark kind a global event list may carry
pub const MARK_RANGE: (u32, u32) = (100, 600);

// ============================================================================
// Event Kinds
// ============================================================================

macro_rules! event_kinds {
    ($($variant:ident = $code:literal,)*) => {
        /// Every event kind the trace producer emits.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u32)]
        pub enum EventKind {
            $($variant = $code,)*
        }

        impl EventKind {
            /// All known kinds, in code order
            pub const ALL: &'static [EventKind] = &[$(EventKind::$variant,)*];

            /// Look up a kind by its wire code.
            #[must_use]
            pub const fn from_code(code: u32) -> Option<EventKind> {
                match code {
                    $($code => Some(EventKind::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

event_kinds! {
    IdleIn = 0,
    IdleOut = 1,
    BufferQueueDequeueStart = 100,
    BufferQueueDequeueDone = 101,
    BufferQueueQueueStart = 102,
    BufferQueueQueueDone = 103,
    BufferQueueAcquire = 104,
    BufferQueueReleased = 105,
    BufferFillJank = 106,
    ExoSurfaceAttach = 200,
    ExoProduceResource = 201,
    ExoBound = 202,
    ExoPendingQuery = 203,
    ExoReleased = 204,
    ExoJank = 205,
    ChromeBarrierOrder = 300,
    ChromeBarrierFlush = 301,
    SurfaceFlingerVsyncHandler = 400,
    SurfaceFlingerInvalidationStart = 401,
    SurfaceFlingerInvalidationDone = 402,
    SurfaceFlingerCompositionStart = 403,
    SurfaceFlingerCompositionDone = 404,
    SurfaceFlingerCompositionJank = 405,
    ChromeOsDraw = 500,
    ChromeOsSwap = 501,
    ChromeOsWaitForAck = 502,
    ChromeOsPresentationDone = 503,
    ChromeOsSwapDone = 504,
    ChromeOsJank = 505,
    CustomEvent = 600,
    MemTotal = 10_000,
    MemUsed = 10_001,
    SwapRead = 10_002,
    SwapWrite = 10_003,
    SwapWait = 10_004,
    GemObjects = 10_005,
    GemSize = 10_006,
    GpuFrequency = 10_007,
    CpuTemperature = 10_008,
    CpuFrequency = 10_009,
    CpuPower = 10_010,
    GpuPower = 10_011,
    MemoryPower = 10_012,
    PackagePowerConstraint = 10_013,
}

impl EventKind {
    /// Wire code of this kind
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Render attributes for this kind.
    #[must_use]
    pub const fn attributes(self) -> EventAttributes {
        use EventKind::{
            BufferFillJank, BufferQueueAcquire, BufferQueueDequeueDone, BufferQueueDequeueStart,
            BufferQueueQueueDone, BufferQueueQueueStart, BufferQueueReleased, ChromeBarrierFlush,
            ChromeBarrierOrder, ChromeOsDraw, ChromeOsJank, ChromeOsPresentationDone,
            ChromeOsSwap, ChromeOsSwapDone, ChromeOsWaitForAck, CpuFrequency, CpuPower,
            CpuTemperature, CustomEvent, ExoBound, ExoJank, ExoPendingQuery, ExoProduceResource,
            ExoReleased, ExoSurfaceAttach, GemObjects, GemSize, GpuFrequency, GpuPower, IdleIn,
            IdleOut, MemTotal, MemUsed, MemoryPower, PackagePowerConstraint, SurfaceFlingerCompositionDone,
            SurfaceFlingerCompositionJank, SurfaceFlingerCompositionStart,
            SurfaceFlingerInvalidationDone, SurfaceFlingerInvalidationStart,
            SurfaceFlingerVsyncHandler, SwapRead, SwapWait, SwapWrite,
        };
        match self {
            IdleIn => EventAttributes::span("#ffffff", "idle").unused(),
            IdleOut => EventAttributes::span("#cbcbcb", "active"),
            BufferQueueDequeueStart => EventAttributes::span("#99cc00", "app requests buffer"),
            BufferQueueDequeueDone => EventAttributes::span("#669999", "app fills buffer"),
            BufferQueueQueueStart => EventAttributes::span("#cccc00", "app queues buffer"),
            BufferQueueQueueDone => EventAttributes::span("#000000", "buffer is queued").unused(),
            BufferQueueAcquire => EventAttributes::span("#66ffcc", "use buffer"),
            BufferQueueReleased => EventAttributes::span("#000000", "buffer released").unused(),
            BufferFillJank => EventAttributes::marker("#ff0000", "buffer filling jank"),
            ExoSurfaceAttach => EventAttributes::span("#99ccff", "surface attach"),
            ExoProduceResource => EventAttributes::span("#cc66ff", "produce resource"),
            ExoBound => EventAttributes::span("#66ffff", "buffer bound"),
            ExoPendingQuery => EventAttributes::span("#00cc99", "pending query"),
            ExoReleased => EventAttributes::span("#000000", "released").unused(),
            ExoJank => EventAttributes::marker("#ff0000", "surface attach jank"),
            ChromeBarrierOrder => EventAttributes::span("#ff9933", "barrier order"),
            ChromeBarrierFlush => EventAttributes::span("#000000", "barrier flush").unused(),
            SurfaceFlingerVsyncHandler => EventAttributes::span("#ff3300", "vsync").stroke(0.5),
            SurfaceFlingerInvalidationStart => EventAttributes::span("#ff9933", "invalidation start"),
            SurfaceFlingerInvalidationDone => {
                EventAttributes::span("#000000", "invalidation done").unused()
            }
            SurfaceFlingerCompositionStart => EventAttributes::span("#3399ff", "composition start"),
            SurfaceFlingerCompositionDone => {
                EventAttributes::span("#000000", "composition done").unused()
            }
            SurfaceFlingerCompositionJank => {
                EventAttributes::marker("#ff0000", "Android composition jank")
            }
            ChromeOsDraw => EventAttributes::span("#3399ff", "draw"),
            ChromeOsSwap => EventAttributes::span("#cc9933", "swap"),
            ChromeOsWaitForAck => EventAttributes::span("#ccffff", "wait for ack"),
            ChromeOsPresentationDone => EventAttributes::span("#ffbf00", "presentation done"),
            ChromeOsSwapDone => EventAttributes::span("#65f441", "swap done"),
            ChromeOsJank => EventAttributes::marker("#ff0000", "Chrome composition jank"),
            CustomEvent => EventAttributes::marker("#7cb342", "custom event"),
            MemTotal => EventAttributes::span("#009900", "total memory"),
            MemUsed => EventAttributes::span("#ff9900", "used memory"),
            SwapRead => EventAttributes::span("#0099ff", "swap read sectors"),
            SwapWrite => EventAttributes::span("#ff3399", "swap write sectors"),
            SwapWait => EventAttributes::span("#9933ff", "swap wait"),
            GemObjects => EventAttributes::span("#666600", "GEM objects"),
            GemSize => EventAttributes::span("#006666", "GEM size"),
            GpuFrequency => EventAttributes::span("#cc3300", "GPU frequency"),
            CpuTemperature => EventAttributes::span("#ff8000", "CPU temperature"),
            CpuFrequency => EventAttributes::span("#3d5afe", "CPU frequency"),
            CpuPower => EventAttributes::span("#ff3d00", "CPU power"),
            GpuPower => EventAttributes::span("#00c853", "GPU power"),
            MemoryPower => EventAttributes::span("#ff9100", "memory power"),
            PackagePowerConstraint => EventAttributes::span("#aa00ff", "package power constraint"),
        }
    }

    /// Successor set deciding whether this kind ends a sequence.
    ///
    /// - `None`: never ends a sequence
    /// - `Some(&[])`: always ends a sequence
    /// - `Some(set)`: ends it only when the next matching event is in `set`
    #[must_use]
    pub const fn terminators(self) -> Option<&'static [EventKind]> {
        use EventKind::{
            BufferQueueQueueDone, BufferQueueReleased, ChromeBarrierFlush, ChromeOsDraw,
            ChromeOsSwap, ChromeOsSwapDone, ExoReleased, IdleIn, SurfaceFlingerCompositionDone,
            SurfaceFlingerInvalidationDone,
        };
        match self {
            IdleIn
            | BufferQueueQueueDone
            | BufferQueueReleased
            | ExoReleased
            | ChromeBarrierFlush
            | SurfaceFlingerInvalidationDone
            | SurfaceFlingerCompositionDone => Some(&[]),
            ChromeOsSwapDone => Some(&[ChromeOsDraw, ChromeOsSwap]),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attributes().name)
    }
}

// ============================================================================
// Render Attributes
// ============================================================================

/// How a kind is drawn and labelled
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventAttributes {
    /// Fill color for spans, stroke color for markers and charts
    pub color: Rgb,
    /// Human readable label used in tooltips
    pub name: &'static str,
    /// Stroke width for global marker lines
    pub width: f64,
    /// Radius of the circle drawn on top of a global marker, if any
    pub radius: Option<f64>,
    /// Spans started by this kind are not painted
    pub unused: bool,
}

impl EventAttributes {
    const fn span(color: &str, name: &'static str) -> Self {
        Self { color: Rgb::hex(color), name, width: 0.1, radius: None, unused: false }
    }

    const fn marker(color: &str, name: &'static str) -> Self {
        Self { color: Rgb::hex(color), name, width: 1.0, radius: Some(4.0), unused: false }
    }

    const fn stroke(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    const fn unused(mut self) -> Self {
        self.color = UNUSED_COLOR;
        self.unused = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_code(kind.code()), Some(*kind));
        }
        assert_eq!(EventKind::from_code(7), None);
        assert_eq!(EventKind::from_code(10_014), None);
    }

    #[test]
    fn test_terminators_render_unused() {
        for kind in EventKind::ALL {
            if matches!(kind.terminators(), Some(set) if set.is_empty()) {
                assert!(kind.attributes().unused, "{kind:?} should not be painted");
            }
        }
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(Rgb::hex("#ff3300"), Rgb(255, 51, 0));
    }
}
