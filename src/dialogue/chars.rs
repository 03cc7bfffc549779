//! Character portraits: a per-character state machine over the dialogue lines.
//!
//! Each text line (and each `@wait`/`@sleep` once someone has spoken) yields one
//! [`ClipDescriptor`] per character, plus a final exit descriptor. Since every
//! character yields the same number of descriptors, characters rendered together
//! can be restacked slice by slice so the speaker always sits on the top track.

use std::rc::Rc;

use log::debug;

use crate::context::ConfigContext;
use crate::dialogue::info::CharacterInfo;
use crate::durations::Frames;
use crate::errors::{GenError, GenResult};
use crate::filters::{affine, brightness, fade_in, opacity};
use crate::schema::{ProjectConfig, Side};
use crate::script::{Line, SysLine};
use crate::timeline::{Clip, Track};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Offscreen,
    Front,
    Back,
    PendingEnter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    In,
    Out,
    FullEnter,
    HalfEnter,
    FullExit,
    HalfExit,
    StayIn,
    StayOut,
    StayOffscreen,
}

impl Transition {
    pub fn position_after(self) -> Position {
        match self {
            Self::In | Self::FullEnter | Self::StayIn => Position::Front,
            Self::Out | Self::HalfEnter | Self::StayOut => Position::Back,
            Self::FullExit | Self::HalfExit | Self::StayOffscreen => Position::Offscreen,
        }
    }

    /// The transition a character takes on a line when no exit is pending.
    pub fn derive(position: Position, is_speaker: bool) -> Self {
        match (position, is_speaker) {
            (Position::Offscreen, _) => Self::StayOffscreen,
            (Position::PendingEnter, true) => Self::FullEnter,
            (Position::PendingEnter, false) => Self::HalfEnter,
            (Position::Back, true) => Self::In,
            (Position::Back, false) => Self::StayOut,
            (Position::Front, true) => Self::StayIn,
            (Position::Front, false) => Self::Out,
        }
    }

    /// The exit taken from an on-screen position.
    fn exit_from(position: Position) -> Option<Self> {
        match position {
            Position::Front => Some(Self::FullExit),
            Position::Back => Some(Self::HalfExit),
            Position::Offscreen | Position::PendingEnter => None,
        }
    }
}

/// One slice of a character's track before it becomes a clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipDescriptor {
    /// The record as it stood when the line was reached.
    pub info: Rc<CharacterInfo>,
    pub transition: Transition,
    pub expression: Option<String>,
    pub duration: Frames,
    /// Whether the character speaks during this slice.
    pub bring_to_front: bool,
}

impl ClipDescriptor {
    pub fn name(&self) -> Option<&str> {
        self.info.name.as_deref()
    }
}

struct CharacterState {
    target: String,
    position: Position,
    pending_exit: Option<Transition>,
    expression: Option<String>,
    speaker: Option<String>,
    anyone_spoke: bool,
    appears: bool,
}

impl CharacterState {
    fn applies_to_side(
        &self,
        side: Option<Side>,
        ctx: &mut ConfigContext<'_, CharacterInfo>,
    ) -> GenResult<bool> {
        let Some(side) = side else {
            return Ok(true);
        };
        let info = ctx.get_with(Some(&self.target), false)?;
        Ok(info.side_flag().map(Side::of_player_flag) == Some(side))
    }

    fn enter(&mut self) {
        self.position = Position::PendingEnter;
    }

    fn exit(&mut self) {
        match Transition::exit_from(self.position) {
            Some(exit) => self.pending_exit = Some(exit),
            None => self.position = Position::Offscreen,
        }
    }

    fn descriptor(
        &mut self,
        duration: Frames,
        ctx: &mut ConfigContext<'_, CharacterInfo>,
    ) -> GenResult<ClipDescriptor> {
        let is_speaker = self.speaker.as_deref() == Some(self.target.as_str());
        let transition = self
            .pending_exit
            .take()
            .unwrap_or_else(|| Transition::derive(self.position, is_speaker));
        self.position = transition.position_after();

        Ok(ClipDescriptor {
            info: ctx.get_with(Some(&self.target), false)?,
            transition,
            expression: self.expression.clone(),
            duration,
            bring_to_front: is_speaker,
        })
    }
}

/// Runs the state machine for `target` over the whole script.
pub fn interpret(
    lines: &[Line],
    target: &str,
    ctx: &mut ConfigContext<'_, CharacterInfo>,
) -> GenResult<Vec<ClipDescriptor>> {
    let mut state = CharacterState {
        target: ctx.follow_alias(target)?,
        position: Position::Offscreen,
        pending_exit: None,
        expression: None,
        speaker: None,
        anyone_spoke: false,
        appears: false,
    };
    let mut descriptors = Vec::new();

    for line in lines {
        match line {
            Line::Text(text) => {
                let speaker = text
                    .speaker
                    .as_deref()
                    .map(|name| ctx.follow_alias(name))
                    .transpose()?;
                if speaker.as_deref() == Some(state.target.as_str()) {
                    state.appears = true;
                    if let Some(expression) = &text.expression {
                        state.expression = Some(expression.clone());
                    }
                }
                state.speaker = speaker;
                state.anyone_spoke = true;
                descriptors.push(state.descriptor(text.duration, ctx)?);
            }
            Line::Sys(sys) => {
                sys.pre_hook(ctx)?;
                match sys {
                    SysLine::Wait { duration } | SysLine::Sleep { duration } => {
                        if state.anyone_spoke {
                            state.speaker = None;
                            descriptors.push(state.descriptor(*duration, ctx)?);
                        } else {
                            descriptors.push(ClipDescriptor {
                                info: ctx.get_with(Some(&state.target), false)?,
                                transition: Transition::StayOffscreen,
                                expression: state.expression.clone(),
                                duration: *duration,
                                bring_to_front: false,
                            });
                        }
                    }
                    SysLine::Expression { name, expression }
                        if ctx.follow_alias(name)? == state.target =>
                    {
                        state.expression = Some(expression.clone());
                    }
                    SysLine::Enter { name } if ctx.follow_alias(name)? == state.target => {
                        state.appears = true;
                        state.enter();
                    }
                    SysLine::Exit { name } if ctx.follow_alias(name)? == state.target => {
                        state.exit();
                    }
                    SysLine::EnterAll { side } => {
                        if state.applies_to_side(*side, ctx)? {
                            state.enter();
                        }
                    }
                    SysLine::ExitAll { side } => {
                        if state.applies_to_side(*side, ctx)? {
                            state.exit();
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    if !state.appears {
        return Err(GenError::dialogue(format!(
            "'{}' does not appear in the dialogue",
            state.target
        )));
    }

    let info = ctx.get_with(Some(&state.target), false)?;
    let transition = state
        .pending_exit
        .take()
        .or_else(|| Transition::exit_from(state.position))
        .unwrap_or(Transition::StayOffscreen);
    descriptors.push(ClipDescriptor {
        duration: info.exit_duration()?,
        info,
        transition,
        expression: state.expression.clone(),
        bring_to_front: false,
    });

    debug!(
        "{}: {} portrait slices",
        state.target,
        descriptors.len()
    );
    Ok(descriptors)
}

fn movement(transition: Transition, info: &CharacterInfo) -> GenResult<String> {
    let curve = &info.move_curve;
    let keyframes = |from, to, end: Frames| format!("0{curve}={from};{end}={to}");

    let rect = match transition {
        Transition::In => keyframes(info.back_geometry()?, info.front_geometry()?, info.move_end()?),
        Transition::Out => keyframes(info.front_geometry()?, info.back_geometry()?, info.move_end()?),
        Transition::FullEnter => keyframes(
            info.offstage_geometry()?,
            info.front_geometry()?,
            info.enter_end()?,
        ),
        Transition::HalfEnter => keyframes(
            info.offstage_back_geometry()?,
            info.back_geometry()?,
            info.enter_end()?,
        ),
        Transition::FullExit => keyframes(
            info.front_geometry()?,
            info.offstage_geometry()?,
            info.move_end()?,
        ),
        Transition::HalfExit => keyframes(
            info.back_geometry()?,
            info.offstage_back_geometry()?,
            info.move_end()?,
        ),
        Transition::StayIn => info.front_geometry()?.to_string(),
        Transition::StayOut | Transition::StayOffscreen => info.back_geometry()?.to_string(),
    };
    Ok(rect)
}

fn brightness_levels(transition: Transition, info: &CharacterInfo) -> GenResult<String> {
    let (front, back) = (info.front_brightness, info.back_brightness);
    let levels = match transition {
        Transition::In | Transition::FullEnter => {
            format!("0={back};{}={front}", info.brightness_fade_end()?)
        }
        Transition::Out | Transition::FullExit => {
            format!("0={front};{}={back}", info.brightness_fade_end()?)
        }
        Transition::StayIn => front.to_string(),
        Transition::HalfEnter
        | Transition::HalfExit
        | Transition::StayOut
        | Transition::StayOffscreen => back.to_string(),
    };
    Ok(levels)
}

/// Turns one descriptor into a portrait clip, or a transparent one while off screen.
pub fn to_clip(
    descriptor: &ClipDescriptor,
    ctx: &ConfigContext<'_, CharacterInfo>,
) -> GenResult<Clip> {
    let transition = descriptor.transition;
    if transition == Transition::StayOffscreen {
        return Ok(Clip::transparent(descriptor.duration));
    }

    let info = descriptor.info.as_ref();
    let name = descriptor.name().unwrap_or("common");
    let expression = descriptor.expression.as_deref().ok_or_else(|| {
        GenError::dialogue(format!(
            "'{name}' is trying to appear on screen without an expression"
        ))
    })?;

    let portrait = info
        .portrait_path_format()?
        .replace("{expression}", expression);
    let mut clip = Clip::resource(ctx.resolve_resource(&portrait)?, descriptor.duration)
        .with_filter(affine(movement(transition, info)?))
        .with_filter(brightness(brightness_levels(transition, info)?));

    match transition {
        Transition::FullEnter | Transition::HalfEnter => {
            clip.push_filter(fade_in(info.fade_in_end()?));
        }
        Transition::FullExit | Transition::HalfExit => {
            clip.push_filter(opacity(format!("0=1;{}=0", info.fade_out_end()?)));
        }
        _ => {}
    }

    Ok(clip)
}

/// `char:NAME`: one track for a single character.
pub fn generate(lines: &[Line], name: &str, config: &ProjectConfig) -> GenResult<Track> {
    let mut ctx = ConfigContext::new(config);
    let descriptors = interpret(lines, name, &mut ctx)?;
    let clips = descriptors
        .iter()
        .map(|descriptor| to_clip(descriptor, &ctx))
        .collect::<GenResult<Vec<_>>>()?;
    Ok(Track::with_clips(format!("char:{name}"), clips))
}

/// Restacks per-character descriptor streams so that whoever speaks in a slice moves to
/// the top track. The others keep their relative order. Returns one list per track,
/// top first.
pub fn order_clips(
    streams: Vec<Vec<ClipDescriptor>>,
    names: &[String],
) -> Vec<Vec<ClipDescriptor>> {
    let slices = streams.iter().map(Vec::len).min().unwrap_or(0);
    let mut order: Vec<usize> = (0..names.len()).collect();
    let mut tracks: Vec<Vec<ClipDescriptor>> = vec![Vec::with_capacity(slices); names.len()];

    for slice in 0..slices {
        let speaker = streams
            .iter()
            .position(|stream| stream[slice].bring_to_front);
        if let Some(speaker) = speaker {
            order.retain(|index| *index != speaker);
            order.insert(0, speaker);
        }

        for (track, index) in tracks.iter_mut().zip(&order) {
            track.push(streams[*index][slice].clone());
        }
    }

    tracks
}

/// `chars`, `chars:p`, `chars:e`: several characters sharing a stack of tracks.
pub fn generate_sided(
    lines: &[Line],
    names: &[String],
    label: &str,
    config: &ProjectConfig,
) -> GenResult<Vec<Track>> {
    match names {
        [] => return Ok(Vec::new()),
        [name] => return Ok(vec![generate(lines, name, config)?]),
        _ => {}
    }

    let streams = names
        .iter()
        .map(|name| interpret(lines, name, &mut ConfigContext::new(config)))
        .collect::<GenResult<Vec<_>>>()?;

    let ctx = ConfigContext::new(config);
    order_clips(streams, names)
        .into_iter()
        .enumerate()
        .map(|(index, descriptors)| {
            let clips = descriptors
                .iter()
                .map(|descriptor| to_clip(descriptor, &ctx))
                .collect::<GenResult<Vec<_>>>()?;
            Ok(Track::with_clips(format!("{label} #{}", index + 1), clips))
        })
        .collect()
}

/// Every character who speaks or is `@enter`ed, in order of first mention, restricted to one side if given.
pub fn find_all_names(
    lines: &[Line],
    side: Option<Side>,
    config: &ProjectConfig,
) -> GenResult<Vec<String>> {
    let mut ctx = ConfigContext::<CharacterInfo>::new(config);
    let mut names: Vec<String> = Vec::new();

    for line in lines {
        let named = match line {
            Line::Sys(sys) => {
                sys.pre_hook(&mut ctx)?;
                match sys {
                    SysLine::Enter { name } => Some(name.as_str()),
                    _ => None,
                }
            }
            Line::Text(text) => text.speaker.as_deref(),
        };
        let Some(named) = named else {
            continue;
        };
        let name = ctx.follow_alias(named)?;
        if config.characters.contains_key(&name) && !names.contains(&name) {
            names.push(name);
        }
    }

    match side {
        None => Ok(names),
        Some(side) => {
            let mut sided = Vec::new();
            for name in names {
                let flag = ctx.get_with(Some(&name), false)?.side_flag();
                if flag.map(Side::of_player_flag) == Some(side) {
                    sided.push(name);
                }
            }
            Ok(sided)
        }
    }
}
