use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{InpaintError, Result};

pub const GUIDANCE_RANGE: (f64, f64) = (1.0, 20.0);
pub const STEPS_RANGE: (u32, u32) = (10, 50);
pub const ALLOWED_OUTPUTS: [u32; 3] = [1, 2, 4];

/// Seed value asking the service to pick its own seed.
pub const AUTO_SEED: i64 = -1;

/// Upper bound (exclusive) for seeds produced by [`GenerationParameters::randomize_seed`].
const MAX_RANDOM_SEED: i64 = 2_147_483_647;

/// Generation settings sent with each inpainting job.
///
/// # Example
/// ```
/// use inpaint_rs::GenerationParameters;
///
/// let params = GenerationParameters::new("a wooden bench")
///     .negative("blurry, low quality")
///     .guidance_scale(9.0)
///     .steps(40)
///     .seed(1234)
///     .num_outputs(2);
///
/// assert!(params.validate().is_ok());
/// assert_eq!(params.form_fields()[3], ("num_inference_steps", "40".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub prompt: String,
    pub negative_prompt: String,
    pub guidance_scale: f64,
    pub steps: u32,
    pub seed: i64,
    pub num_outputs: u32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            negative_prompt: String::new(),
            guidance_scale: 7.5,
            steps: 30,
            seed: AUTO_SEED,
            num_outputs: 1,
        }
    }
}

impl GenerationParameters {
    /// Defaults (guidance 7.5, 30 steps, automatic seed, one output) with a prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Set the prompt describing what should fill the masked area.
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the negative prompt.
    pub fn negative(mut self, prompt: impl Into<String>) -> Self {
        self.negative_prompt = prompt.into();
        self
    }

    /// Set the guidance scale, clamped to `[1, 20]`.
    pub fn guidance_scale(mut self, scale: f64) -> Self {
        self.set_guidance_scale(scale);
        self
    }

    /// Set the number of inference steps, clamped to `[10, 50]`.
    pub fn steps(mut self, steps: u32) -> Self {
        self.set_steps(steps);
        self
    }

    /// Set a specific seed. Use -1 (the default) to let the service choose.
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the output count. See [`set_num_outputs`](Self::set_num_outputs).
    pub fn num_outputs(mut self, count: u32) -> Self {
        self.set_num_outputs(count);
        self
    }

    pub fn set_guidance_scale(&mut self, scale: f64) {
        self.guidance_scale = if scale.is_finite() {
            scale.clamp(GUIDANCE_RANGE.0, GUIDANCE_RANGE.1)
        } else {
            Self::default().guidance_scale
        };
    }

    pub fn set_steps(&mut self, steps: u32) {
        self.steps = steps.clamp(STEPS_RANGE.0, STEPS_RANGE.1);
    }

    /// Snap to the largest allowed count (1, 2 or 4) not above `count`.
    pub fn set_num_outputs(&mut self, count: u32) {
        self.num_outputs = ALLOWED_OUTPUTS
            .iter()
            .copied()
            .filter(|&n| n <= count)
            .max()
            .unwrap_or(ALLOWED_OUTPUTS[0]);
    }

    /// Replace the seed with a random one in `[0, 2147483647)` and return it.
    pub fn randomize_seed(&mut self) -> i64 {
        self.seed = rand::rng().random_range(0..MAX_RANDOM_SEED);
        self.seed
    }

    /// Whether the service will pick the seed.
    pub fn is_auto_seed(&self) -> bool {
        self.seed == AUTO_SEED
    }

    /// Check every field against its legal range.
    ///
    /// Setters already clamp; this catches values assigned directly to the
    /// public fields. An empty prompt is allowed.
    pub fn validate(&self) -> Result<()> {
        let (lo, hi) = GUIDANCE_RANGE;
        if !self.guidance_scale.is_finite() || self.guidance_scale < lo || self.guidance_scale > hi {
            return Err(InpaintError::Validation(format!(
                "guidance_scale must be between {} and {} (got {})",
                lo, hi, self.guidance_scale
            )));
        }
        let (lo, hi) = STEPS_RANGE;
        if self.steps < lo || self.steps > hi {
            return Err(InpaintError::Validation(format!(
                "steps must be between {} and {} (got {})",
                lo, hi, self.steps
            )));
        }
        if !ALLOWED_OUTPUTS.contains(&self.num_outputs) {
            return Err(InpaintError::Validation(format!(
                "num_outputs must be one of {:?} (got {})",
                ALLOWED_OUTPUTS, self.num_outputs
            )));
        }
        Ok(())
    }

    /// Text form fields for `POST /inpaint`, in submission order.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("prompt", self.prompt.clone()),
            ("negative_prompt", self.negative_prompt.clone()),
            ("guidance_scale", self.guidance_scale.to_string()),
            ("num_inference_steps", self.steps.to_string()),
            ("seed", self.seed.to_string()),
            ("num_outputs", self.num_outputs.to_string()),
        ]
    }
}
