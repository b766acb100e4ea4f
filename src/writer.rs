//! A tiny Screw generator.
//!
//! Turns arbitrary bytes into a Screw program that prints exactly those bytes.
//! Every generated program validates: braces come in pairs and it ends in `~`.
//!
//! ```
//! use screw::ScrewWriter;
//!
//! let code = ScrewWriter::new(b"Hi").generate();
//! assert!(code.ends_with('~'));
//! assert!(screw::compile(&code).is_ok());
//! ```

pub struct WriterOptions {
    pub use_loops: bool,     // Use loop-based multiplication when building from zero
    pub max_loop_factor: u8, // Maximum outer loop counter to consider (e.g., 16..32 is fine)
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            use_loops: true,
            max_loop_factor: 16,
        }
    }
}

pub struct ScrewWriter<'writer> {
    input: &'writer [u8],
    options: WriterOptions,
}

impl<'writer> ScrewWriter<'writer> {
    pub fn new(input: &'writer [u8]) -> Self {
        Self { input, options: WriterOptions::default() }
    }

    pub fn with_options(input: &'writer [u8], options: WriterOptions) -> Self {
        Self { input, options }
    }

    /// Generate the program, terminator included.
    pub fn generate(&self) -> String {
        let mut output = String::new();
        let mut cursor = 0u8;

        for &b in self.input {
            // Option A: delta encodes from cursor -> b using wrapping arithmetic
            let delta_sequence = encode_delta(cursor, b);

            // Option B: clear and rebuild from zero
            let from_zero_sequence = self.encode_from_zero(b);

            let best_sequence = if delta_sequence.len() <= from_zero_sequence.len() {
                delta_sequence
            } else {
                from_zero_sequence
            };

            output.push_str(&best_sequence);
            output.push('.');

            cursor = b;
        }

        output.push('~');
        output
    }

    /// Build exact value `target` in the current cell starting from an unknown prior value.
    fn encode_from_zero(&self, target: u8) -> String {
        // Always start by clearing the current cell
        let mut best = String::from("{-}");
        best.push_str(&"+".repeat(target as usize));

        if !self.options.use_loops || target == 0 {
            return best;
        }

        // Try loop-based constructions of the form:
        //   {-} >{-}<          clear current and temp
        //   +*a { > +*b < - }  temp = a*b, current = 0
        //   > +/-*r            temp = target
        //   { <+> - } <        move temp back into current, return
        let mut best_len = best.len();

        for a in 1..=self.options.max_loop_factor {
            let b = ((target as f32) / (a as f32)).round().clamp(1.0, 255.0) as i32;
            let r = (target as i32) - (a as i32) * b;

            let mut seq = String::from("{-}>{-}<");
            seq.push_str(&"+".repeat(a as usize));
            seq.push_str("{>");
            seq.push_str(&"+".repeat(b as usize));
            seq.push_str("<-}>");
            if r > 0 {
                seq.push_str(&"+".repeat(r as usize));
            } else if r < 0 {
                seq.push_str(&"-".repeat((-r) as usize));
            }
            seq.push_str("{<+>-}<");

            if seq.len() < best_len {
                best_len = seq.len();
                best = seq;
            }
        }

        best
    }
}

/// Shortest run of `+` or `-` taking a cell from `cursor` to `target` on a ring of 256.
fn encode_delta(cursor: u8, target: u8) -> String {
    let forward = target.wrapping_sub(cursor);
    let backward = cursor.wrapping_sub(target);
    if forward <= backward {
        "+".repeat(forward as usize)
    } else {
        "-".repeat(backward as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TapeMachine, compile};
    use std::sync::{Arc, Mutex};

    fn run(code: &str) -> Vec<u8> {
        let mut machine = TapeMachine::new(compile(code).expect("generated code validates"));
        let out = Arc::new(Mutex::new(Vec::new()));
        let sink = out.clone();
        machine.set_output_sink(move |b| sink.lock().unwrap().extend_from_slice(b));
        machine.run().expect("generated code runs");
        out.lock().unwrap().clone()
    }

    #[test]
    fn hello_world_prints_itself() {
        let input = b"Hello World!";
        let code = ScrewWriter::new(input).generate();
        assert_eq!(run(&code), input.to_vec());
    }

    #[test]
    fn zero_and_repeat() {
        let code = ScrewWriter::new(&[0u8, 0, 0]).generate();
        assert_eq!(code, "...~");
    }

    #[test]
    fn high_bytes_survive() {
        let input: Vec<u8> = vec![255, 128, 127, 1, 200, 0];
        let code = ScrewWriter::new(&input).generate();
        assert_eq!(run(&code), input);
    }

    #[test]
    fn without_loops_still_prints() {
        let options = WriterOptions { use_loops: false, max_loop_factor: 0 };
        let code = ScrewWriter::with_options(b"ok", options).generate();
        assert!(!code.contains('>'));
        assert_eq!(run(&code), b"ok".to_vec());
    }

    #[test]
    fn empty_input_is_just_terminator() {
        assert_eq!(ScrewWriter::new(b"").generate(), "~");
    }

    #[test]
    fn delta_prefers_shortest_direction() {
        assert_eq!(encode_delta(0, 3), "+++");
        assert_eq!(encode_delta(0, 254), "--");
        assert_eq!(encode_delta(10, 10), "");
    }
}
