//! Polyphase analysis and synthesis filterbanks.
//!
//! Cosine-modulated banks of 4 or 8 sub-bands built on a 10-tap-per-band
//! prototype window. Analysis followed by synthesis reconstructs the input
//! delayed by `10 * M - M + 1` samples (73 for 8 sub-bands, 37 for 4).

use std::f32::consts::PI;
use std::sync::LazyLock;

use crate::structs::frame::MAX_SUBBANDS;

const TAPS: usize = 10;
const WINDOW: usize = TAPS * MAX_SUBBANDS;
const HISTORY: usize = 2 * WINDOW;

#[rustfmt::skip]
const PROTO_4: [f32; 40] = [
     0.00000000E+00,  5.36548976E-04,  1.49188357E-03,  2.73370904E-03,
     3.83720193E-03,  3.89205149E-03,  1.86581691E-03, -3.06012286E-03,
     1.09137620E-02,  2.04385087E-02,  2.88757392E-02,  3.21939290E-02,
     2.58767811E-02,  6.13245186E-03, -2.88217274E-02, -7.76463494E-02,
     1.35593274E-01,  1.94987841E-01,  2.46636662E-01,  2.81828203E-01,
     2.94315332E-01,  2.81828203E-01,  2.46636662E-01,  1.94987841E-01,
    -1.35593274E-01, -7.76463494E-02, -2.88217274E-02,  6.13245186E-03,
     2.58767811E-02,  3.21939290E-02,  2.88757392E-02,  2.04385087E-02,
    -1.09137620E-02, -3.06012286E-03,  1.86581691E-03,  3.89205149E-03,
     3.83720193E-03,  2.73370904E-03,  1.49188357E-03,  5.36548976E-04,
];

#[rustfmt::skip]
const PROTO_8: [f32; 80] = [
     0.00000000E+00,  1.56575398E-04,  3.43256425E-04,  5.54620202E-04,
     8.23919506E-04,  1.13992507E-03,  1.47640169E-03,  1.78371725E-03,
     2.01182542E-03,  2.10371989E-03,  1.99454554E-03,  1.61656283E-03,
     9.02154502E-04, -1.78805361E-04, -1.64973098E-03, -3.49717454E-03,
     5.65949473E-03,  8.02941163E-03,  1.04584443E-02,  1.27472335E-02,
     1.46525263E-02,  1.59045603E-02,  1.62208471E-02,  1.53184106E-02,
     1.29371806E-02,  8.85757540E-03,  2.92408442E-03, -4.91578024E-03,
    -1.46404076E-02, -2.61098752E-02, -3.90751381E-02, -5.31873032E-02,
     6.79989431E-02,  8.29847578E-02,  9.75753918E-02,  1.11196689E-01,
     1.23264548E-01,  1.33264415E-01,  1.40753505E-01,  1.45389847E-01,
     1.46955068E-01,  1.45389847E-01,  1.40753505E-01,  1.33264415E-01,
     1.23264548E-01,  1.11196689E-01,  9.75753918E-02,  8.29847578E-02,
    -6.79989431E-02, -5.31873032E-02, -3.90751381E-02, -2.61098752E-02,
    -1.46404076E-02, -4.91578024E-03,  2.92408442E-03,  8.85757540E-03,
     1.29371806E-02,  1.53184106E-02,  1.62208471E-02,  1.59045603E-02,
     1.46525263E-02,  1.27472335E-02,  1.04584443E-02,  8.02941163E-03,
    -5.65949473E-03, -3.49717454E-03, -1.64973098E-03, -1.78805361E-04,
     9.02154502E-04,  1.61656283E-03,  1.99454554E-03,  2.10371989E-03,
     2.01182542E-03,  1.78371725E-03,  1.47640169E-03,  1.13992507E-03,
     8.23919506E-04,  5.54620202E-04,  3.43256425E-04,  1.56575398E-04,
];

/// Modulation matrices for one sub-band count.
struct Cosines {
    /// Analysis: `[sb][k] = cos((sb + 0.5) * (k - M/2) * PI / M)`, k < 2M.
    analysis: [[f32; 2 * MAX_SUBBANDS]; MAX_SUBBANDS],
    /// Synthesis: `[k][sb] = cos((sb + 0.5) * (k + M/2) * PI / M)`, k < 2M.
    synthesis: [[f32; MAX_SUBBANDS]; 2 * MAX_SUBBANDS],
}

impl Cosines {
    fn new(m: usize) -> Self {
        let mut analysis = [[0f32; 2 * MAX_SUBBANDS]; MAX_SUBBANDS];
        let mut synthesis = [[0f32; MAX_SUBBANDS]; 2 * MAX_SUBBANDS];
        let half = m as f32 / 2.0;

        for sb in 0..m {
            let phase = (sb as f32 + 0.5) * PI / m as f32;
            for k in 0..2 * m {
                analysis[sb][k] = (phase * (k as f32 - half)).cos();
                synthesis[k][sb] = (phase * (k as f32 + half)).cos();
            }
        }

        Self {
            analysis,
            synthesis,
        }
    }
}

static COSINES_4: LazyLock<Cosines> = LazyLock::new(|| Cosines::new(4));
static COSINES_8: LazyLock<Cosines> = LazyLock::new(|| Cosines::new(8));

fn tables(m: usize) -> (&'static [f32], &'static Cosines) {
    if m == 4 {
        (&PROTO_4[..], &*COSINES_4)
    } else {
        (&PROTO_8[..], &*COSINES_8)
    }
}

/// Per-channel analysis state: the last `10 * M` input samples.
#[derive(Debug, Clone)]
pub struct Analysis {
    x: [f32; WINDOW],
}

impl Default for Analysis {
    fn default() -> Self {
        Self { x: [0.0; WINDOW] }
    }
}

impl Analysis {
    pub fn reset(&mut self) {
        self.x = [0.0; WINDOW];
    }

    /// Consumes `M` time-ordered samples and produces `M` sub-band samples.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        let m = output.len();
        let len = TAPS * m;
        let (proto, cos) = tables(m);

        self.x.copy_within(0..len - m, m);
        for (i, &sample) in input[..m].iter().enumerate() {
            self.x[m - 1 - i] = sample;
        }

        let mut y = [0f32; 2 * MAX_SUBBANDS];
        for (i, y) in y[..2 * m].iter_mut().enumerate() {
            *y = (0..TAPS / 2)
                .map(|j| {
                    let idx = i + j * 2 * m;
                    proto[idx] * self.x[idx]
                })
                .sum();
        }

        for (sb, out) in output.iter_mut().enumerate() {
            *out = cos.analysis[sb][..2 * m]
                .iter()
                .zip(&y[..2 * m])
                .map(|(c, y)| c * y)
                .sum();
        }
    }
}

/// Per-channel synthesis state: the `V` vector, `20 * M` entries.
#[derive(Debug, Clone)]
pub struct Synthesis {
    v: [f32; HISTORY],
}

impl Default for Synthesis {
    fn default() -> Self {
        Self { v: [0.0; HISTORY] }
    }
}

impl Synthesis {
    pub fn reset(&mut self) {
        self.v = [0.0; HISTORY];
    }

    /// Consumes `M` sub-band samples and produces `M` time-ordered samples.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        let m = output.len();
        let len = 2 * TAPS * m;
        let (proto, cos) = tables(m);

        self.v.copy_within(0..len - 2 * m, 2 * m);
        for k in 0..2 * m {
            self.v[k] = cos.synthesis[k][..m]
                .iter()
                .zip(&input[..m])
                .map(|(c, s)| c * s)
                .sum();
        }

        let gain = -(m as f32);
        for (j, out) in output.iter_mut().enumerate() {
            *out = (0..TAPS)
                .map(|i| {
                    // U keeps the first and last M entries of every 4M slice of V.
                    let w = j + m * i;
                    let block = w / (2 * m);
                    let offset = w % (2 * m);
                    let v = if offset < m {
                        self.v[block * 4 * m + offset]
                    } else {
                        self.v[block * 4 * m + 2 * m + offset]
                    };
                    v * proto[w] * gain
                })
                .sum();
        }
    }
}
