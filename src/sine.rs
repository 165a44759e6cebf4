//! Wavetable sine generator for the stereo test tone

use std::f64::consts::PI;

/// Number of samples in one period of the wavetable
pub const TABLE_SIZE: usize = 200;

/// Table step of the left channel
pub const LEFT_STEP: usize = 1;

/// Table step of the right channel, a higher pitch so left and right can be told apart
pub const RIGHT_STEP: usize = 3;

/// One period of a sine wave
#[derive(Clone)]
pub struct SineTable
{
    samples: [f32; TABLE_SIZE],
}

impl SineTable
{
    /// Precompute the table
    pub fn new() -> SineTable
    {
        let mut samples = [0.0f32; TABLE_SIZE];
        for (i, sample) in samples.iter_mut().enumerate()
        {
            *sample = ((i as f64 / TABLE_SIZE as f64) * PI * 2.0).sin() as f32;
        }
        SineTable { samples }
    }

    /// Sample at a table index, which must be below `TABLE_SIZE`
    pub fn get(&self, index: usize) -> f32
    {
        self.samples[index]
    }

    /// All samples of the period
    pub fn samples(&self) -> &[f32]
    {
        &self.samples
    }
}

impl Default for SineTable
{
    fn default() -> SineTable
    {
        SineTable::new()
    }
}

/// Two phase counters walking the same table at different speeds
///
/// Runs inside the audio callback: `fill` does not allocate, lock or block.
#[derive(Clone)]
pub struct StereoSine
{
    table: SineTable,
    left_phase: usize,
    right_phase: usize,
    left_step: usize,
    right_step: usize,
}

impl StereoSine
{
    /// Left at the table frequency, right three times higher
    pub fn new() -> StereoSine
    {
        StereoSine::with_steps(LEFT_STEP, RIGHT_STEP)
    }

    /// Custom table steps per frame
    ///
    /// # Panics
    ///
    /// When a step is zero or not below `TABLE_SIZE`.
    pub fn with_steps(left_step: usize, right_step: usize) -> StereoSine
    {
        assert!((1..TABLE_SIZE).contains(&left_step), "left step out of range: {}", left_step);
        assert!((1..TABLE_SIZE).contains(&right_step), "right step out of range: {}", right_step);
        StereoSine
        {
            table: SineTable::new(),
            left_phase: 0,
            right_phase: 0,
            left_step,
            right_step,
        }
    }

    /// Current `(left, right)` table indices
    pub fn phases(&self) -> (usize, usize)
    {
        (self.left_phase, self.right_phase)
    }

    /// Write interleaved stereo frames into `output`
    ///
    /// A trailing half frame is written as silence.
    pub fn fill(&mut self, output: &mut [f32])
    {
        let mut frames = output.chunks_exact_mut(2);
        for frame in &mut frames
        {
            frame[0] = self.table.get(self.left_phase);
            frame[1] = self.table.get(self.right_phase);
            self.left_phase = advance(self.left_phase, self.left_step);
            self.right_phase = advance(self.right_phase, self.right_step);
        }
        for sample in frames.into_remainder()
        {
            *sample = 0.0;
        }
    }
}

impl Default for StereoSine
{
    fn default() -> StereoSine
    {
        StereoSine::new()
    }
}

fn advance(phase: usize, step: usize) -> usize
{
    let next = phase + step;
    if next >= TABLE_SIZE { next - TABLE_SIZE } else { next }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn close(a: f32, b: f32) -> bool
    {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn table_is_one_period()
    {
        let table = SineTable::new();
        assert_eq!(table.samples().len(), TABLE_SIZE);
        assert!(close(table.get(0), 0.0));
        assert!(close(table.get(50), 1.0));
        assert!(close(table.get(100), 0.0));
        assert!(close(table.get(150), -1.0));
        assert!(table.samples().iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn channels_walk_at_different_speeds()
    {
        let table = SineTable::new();
        let mut sine = StereoSine::new();
        let mut out = [0.0f32; 8];
        sine.fill(&mut out);

        for frame in 0 .. 4
        {
            assert_eq!(out[frame * 2], table.get(frame));
            assert_eq!(out[frame * 2 + 1], table.get(frame * 3));
        }
        assert_eq!(sine.phases(), (4, 12));
    }

    #[test]
    fn phases_wrap_around_the_table()
    {
        let mut sine = StereoSine::new();
        let mut out = vec![0.0f32; 2 * 67];
        sine.fill(&mut out);
        // 67 * 3 = 201
        assert_eq!(sine.phases(), (67, 1));

        let mut rest = vec![0.0f32; 2 * 133];
        sine.fill(&mut rest);
        assert_eq!(sine.phases(), (0, 0));
    }

    #[test]
    fn phases_continue_between_buffers()
    {
        let mut whole = StereoSine::new();
        let mut split = StereoSine::new();

        let mut expected = vec![0.0f32; 2 * 128];
        whole.fill(&mut expected);

        let mut actual = vec![0.0f32; 2 * 128];
        let (first, second) = actual.split_at_mut(2 * 64);
        split.fill(first);
        split.fill(second);

        assert_eq!(actual, expected);
        assert_eq!(whole.phases(), split.phases());
    }

    #[test]
    fn odd_length_leaves_silence()
    {
        let mut sine = StereoSine::with_steps(50, 50);
        let mut out = [9.0f32; 5];
        sine.fill(&mut out);
        assert!(close(out[2], 1.0));
        assert_eq!(out[4], 0.0);
        assert_eq!(sine.phases(), (100, 100));
    }

    #[test]
    #[should_panic]
    fn step_must_fit_the_table()
    {
        StereoSine::with_steps(1, TABLE_SIZE);
    }
}
