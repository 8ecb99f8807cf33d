//! Encoding of the value stored for `sched_switch` entries.
//!
//! One 64-bit field carries two values: the pid of the task being switched
//! out in the low 56 bits, and its `prev_state` in the top 8 bits.

/// Number of bits below the `prev_state` byte.
const PREV_STATE_SHIFT: u32 = (i64::BITS / 8 - 1) * 8;
const PREV_STATE_MASK: i64 = (1 << 8) - 1;
const PID_MASK: i64 = (1 << PREV_STATE_SHIFT) - 1;

/// Bits of `prev_state` that describe a sleeping or stopped task. A switch
/// with none of them set means the task was preempted while runnable.
pub const TASK_STATE_MASK: i32 = 0x7f;

/// Stores `pid` in the field, clearing anything else.
pub fn set_pid(field: &mut i64, pid: i64) {
    *field = pid & PID_MASK;
}

/// Returns the pid stored in the field.
#[allow(clippy::cast_possible_truncation)]
pub const fn pid(field: i64) -> i32 {
    (field & PID_MASK) as i32
}

/// Stores `prev_state` in the top byte, keeping the pid.
pub fn set_prev_state(field: &mut i64, prev_state: i64) {
    let mask = PREV_STATE_MASK << PREV_STATE_SHIFT;
    *field &= !mask;
    *field |= (prev_state & PREV_STATE_MASK) << PREV_STATE_SHIFT;
}

/// Returns the `prev_state` stored in the field.
#[allow(clippy::cast_possible_truncation)]
pub const fn prev_state(field: i64) -> i32 {
    // Shifting first keeps the sign bit out of the result.
    ((field >> PREV_STATE_SHIFT) & PREV_STATE_MASK) as i32
}

/// Packs a switched-out task and its state into one field.
pub fn encode(pid: i64, prev_state: i64) -> i64 {
    let mut field = 0;
    set_pid(&mut field, pid);
    set_prev_state(&mut field, prev_state);
    field
}

/// True if the encoded task was still runnable when it was switched out.
pub const fn was_preempted(field: i64) -> bool {
    prev_state(field) & TASK_STATE_MASK == 0
}
