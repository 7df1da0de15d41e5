//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects, no external files needed. Every
//! sound goes through one output bus: a high-pass filter that closes in while
//! the danger hint is on, then a volume gain.

use web_sys::{
    AudioContext, BiquadFilterNode, BiquadFilterType, GainNode, OscillatorNode, OscillatorType,
};

use crate::experp;
use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoundEffect {
    /// Fruit released from a slot
    Drop,
    /// Two fruit merged; `fraction` is rank / max rank
    Pop { fraction: f32 },
    GameOver,
}

/// High-pass cutoff while in danger (Hz)
const DANGER_CUTOFF: f32 = 1500.0;
/// High-pass cutoff otherwise; effectively open
const OPEN_CUTOFF: f32 = 10.0;

struct Bus {
    filter: BiquadFilterNode,
    gain: GainNode,
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    bus: Option<Bus>,
    settings: Settings,
    danger: bool,
}

impl AudioManager {
    pub fn new(settings: Settings) -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        let bus = ctx.as_ref().and_then(Self::create_bus);
        let manager = Self {
            ctx,
            bus,
            settings,
            danger: false,
        };
        manager.apply_volume();
        manager
    }

    fn create_bus(ctx: &AudioContext) -> Option<Bus> {
        let filter = ctx.create_biquad_filter().ok()?;
        let gain = ctx.create_gain().ok()?;
        filter.set_type(BiquadFilterType::Highpass);
        filter.frequency().set_value(OPEN_CUTOFF);
        filter.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;
        Some(Bus { filter, gain })
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.apply_volume();
    }

    fn apply_volume(&self) {
        if let Some(bus) = &self.bus {
            bus.gain.gain().set_value(self.settings.effective_sfx_volume());
        }
    }

    /// Close the high-pass filter while in danger
    pub fn set_danger(&mut self, danger: bool) {
        if self.danger == danger {
            return;
        }
        self.danger = danger;
        if let (Some(ctx), Some(bus)) = (&self.ctx, &self.bus) {
            let cutoff = if danger { DANGER_CUTOFF } else { OPEN_CUTOFF };
            bus.filter
                .frequency()
                .set_target_at_time(cutoff, ctx.current_time(), 0.1)
                .ok();
        }
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        if self.settings.effective_sfx_volume() <= 0.0 {
            return;
        }
        let (Some(ctx), Some(bus)) = (&self.ctx, &self.bus) else {
            return;
        };

        // Browsers keep the context suspended until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Drop => Self::play_drop(ctx, bus),
            SoundEffect::Pop { fraction } => Self::play_pop(ctx, bus, fraction),
            SoundEffect::GameOver => Self::play_game_over(ctx, bus),
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope, routed into the bus
    fn create_osc(
        ctx: &AudioContext,
        bus: &Bus,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&bus.filter).ok()?;

        Some((osc, gain))
    }

    /// Drop - soft falling blip
    fn play_drop(ctx: &AudioContext, bus: &Bus) {
        let Some((osc, gain)) = Self::create_osc(ctx, bus, 500.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(0.4, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.12)
            .ok();
        osc.frequency().set_value_at_time(500.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(250.0, t + 0.12)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.15).ok();
    }

    /// Pop - bubbly burst; bigger fruit pop lower
    fn play_pop(ctx: &AudioContext, bus: &Bus, fraction: f32) {
        let rate = experp(1.2, 0.6, fraction.clamp(0.0, 1.0));
        let base = 660.0 * rate;
        let Some((osc, gain)) = Self::create_osc(ctx, bus, base, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(1.0, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.18)
            .ok();
        osc.frequency().set_value_at_time(base * 0.5, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(base * 1.5, t + 0.06)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.2).ok();
    }

    /// Game over - sad descending
    fn play_game_over(ctx: &AudioContext, bus: &Bus) {
        for (i, freq) in [400.0, 350.0, 300.0, 200.0].iter().enumerate() {
            let delay = i as f64 * 0.2;
            if let Some((osc, gain)) = Self::create_osc(ctx, bus, *freq, OscillatorType::Sine) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(1.0, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.4).ok();
            }
        }
    }
}
