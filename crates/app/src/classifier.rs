//! Console line classification.
//!
//! [`LineClassifier::classify`] walks an ordered rule table; the first rule
//! whose predicate matches owns the line, even if its handler then fails to
//! parse it. Two-line sequences (typed digits then confirmation, control
//! message then raw IR bytes) are correlated through [`Lookback`], which the
//! caller advances after each line.

use tracing::{debug, warn};

use slingwatch_domain::classification::{BoxAction, Classification};
use slingwatch_domain::error::SlingError;
use slingwatch_domain::registry::BoxRegistry;
use slingwatch_domain::time::Timestamp;

use crate::command::{ChannelCommand, CommandInterpreter};

const DISCOVERY_PREFIX: &str = "BOXES [";
const ANALOGUE_MARKER: &str = "got ProHD";
const START_CHANNEL_MARKER: &str = "Sending Start Channel";
const DIGITS_MARKER: &str = "Sending Channel Digits";
const CONTROL_MESSAGE_IR_MARKER: &str = "Got Streamer Control Message IR";
const IR_BYTES_MARKER: &str = "IR [b";
const KEYCODE_MARKER: &str = "Sending IR keycode";
const STREAMING_MARKERS: [&str; 4] = [
    "Selecting Video Source",
    "Got Streamer Control Message",
    "New Stream Starting",
    "Stream started at",
];
const CLIENTS_MARKER: &str = "Clients";
const STOPPED_MARKERS: [&str; 3] = ["Shutting down connections", "Logging Out", "Giving up. Sorry"];
const FAULT_MARKER: &str = "Error Starting Session. Slingbox might be Bricked";
const REMOTE_REFUSED_MARKER: &str = "Ignoring IR request from";
const REMOTE_LOCKED_MARKER: &str = "Remote Locked";

/// First half of a two-line sequence, waiting for its confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    /// `Sending Channel Digits ...` awaiting the box's control-message
    /// confirmation.
    Digits(String),
    /// `<box> Got Streamer Control Message IR` awaiting the raw IR bytes.
    ControlMessage {
        /// Box named on the control-message line, dots removed.
        box_name: String,
    },
}

/// The one-line lookback register as an explicit state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Lookback {
    #[default]
    Idle,
    AwaitingConfirmation(Pending),
}

impl Lookback {
    /// Transition after `line` has been processed.
    ///
    /// Noise lines leave the state untouched so interleaved HTTP fetches and
    /// remote connections do not break a pending sequence. Any other line
    /// replaces it.
    pub fn advance(&mut self, line: &str) {
        if is_noise(line) {
            return;
        }
        *self = if line.starts_with(DIGITS_MARKER) {
            Self::AwaitingConfirmation(Pending::Digits(line.to_string()))
        } else if line.contains(CONTROL_MESSAGE_IR_MARKER) {
            Self::AwaitingConfirmation(Pending::ControlMessage {
                box_name: first_token_name(line).unwrap_or_default(),
            })
        } else {
            Self::Idle
        };
    }

    fn pending_digits(&self) -> Option<&str> {
        match self {
            Self::AwaitingConfirmation(Pending::Digits(line)) => Some(line),
            _ => None,
        }
    }

    fn pending_control_message(&self) -> Option<&str> {
        match self {
            Self::AwaitingConfirmation(Pending::ControlMessage { box_name }) => Some(box_name),
            _ => None,
        }
    }
}

/// Lines that never become the lookback value.
#[must_use]
pub fn is_noise(line: &str) -> bool {
    line.starts_with("GET ")
        || line.starts_with("Remote Control Connected")
        || line.contains("RemoteControl connection from ")
}

/// Everything a rule sees about the line being classified.
struct LineContext<'a> {
    line: &'a str,
    lookback: &'a Lookback,
    now: Timestamp,
}

type Matcher = fn(&LineContext<'_>, &BoxRegistry) -> bool;
type Handler =
    fn(&LineClassifier, &LineContext<'_>, &mut BoxRegistry) -> Result<Classification, SlingError>;

struct Rule {
    name: &'static str,
    matches: Matcher,
    apply: Handler,
}

/// Rules in precedence order.
const RULES: &[Rule] = &[
    Rule {
        name: "discovery",
        matches: |ctx, registry| ctx.line.starts_with(DISCOVERY_PREFIX) && registry.is_empty(),
        apply: LineClassifier::discover,
    },
    Rule {
        name: "analogue_channel",
        matches: |ctx, _| ctx.line.contains(ANALOGUE_MARKER),
        apply: LineClassifier::analogue_channel,
    },
    Rule {
        name: "start_channel",
        matches: |ctx, _| ctx.line.contains(START_CHANNEL_MARKER),
        apply: LineClassifier::start_channel,
    },
    Rule {
        name: "digits_confirmed",
        matches: |ctx, _| {
            ctx.line.contains(CONTROL_MESSAGE_IR_MARKER) && ctx.lookback.pending_digits().is_some()
        },
        apply: LineClassifier::digits_confirmed,
    },
    Rule {
        name: "ir_bytes",
        matches: |ctx, _| {
            ctx.line.starts_with(IR_BYTES_MARKER)
                && ctx.lookback.pending_control_message().is_some()
        },
        apply: LineClassifier::ir_bytes,
    },
    Rule {
        name: "ir_keycode",
        matches: |ctx, _| ctx.line.contains(KEYCODE_MARKER),
        apply: LineClassifier::ir_keycode,
    },
    Rule {
        name: "streaming",
        matches: |ctx, _| STREAMING_MARKERS.iter().any(|marker| ctx.line.contains(marker)),
        apply: LineClassifier::streaming,
    },
    Rule {
        name: "clients",
        matches: |ctx, _| ctx.line.starts_with('.') && ctx.line.contains(CLIENTS_MARKER),
        apply: LineClassifier::clients,
    },
    Rule {
        name: "stopped",
        matches: |ctx, _| STOPPED_MARKERS.iter().any(|marker| ctx.line.contains(marker)),
        apply: LineClassifier::stopped,
    },
    Rule {
        name: "faulted",
        matches: |ctx, _| ctx.line.contains(FAULT_MARKER),
        apply: |_, ctx, _| Ok(report(ctx.line, 0, BoxAction::Faulted)),
    },
    Rule {
        name: "remote_locked",
        matches: |ctx, _| {
            ctx.line.contains(REMOTE_REFUSED_MARKER) && ctx.line.contains(REMOTE_LOCKED_MARKER)
        },
        apply: |_, ctx, _| Ok(report(ctx.line, 0, BoxAction::RemoteLocked)),
    },
];

/// Stateless dispatcher from console lines to registry mutations.
#[derive(Debug, Clone, Default)]
pub struct LineClassifier {
    interpreter: CommandInterpreter,
}

impl LineClassifier {
    #[must_use]
    pub fn new(interpreter: CommandInterpreter) -> Self {
        Self { interpreter }
    }

    /// Rule names in the order they are tried.
    pub fn rule_names() -> impl Iterator<Item = &'static str> {
        RULES.iter().map(|rule| rule.name)
    }

    /// Name of the rule that would own `line`, if any.
    #[must_use]
    pub fn matching_rule(
        line: &str,
        lookback: &Lookback,
        registry: &BoxRegistry,
    ) -> Option<&'static str> {
        let ctx = LineContext {
            line,
            lookback,
            now: slingwatch_domain::time::now(),
        };
        RULES
            .iter()
            .find(|rule| (rule.matches)(&ctx, registry))
            .map(|rule| rule.name)
    }

    /// Classify one trimmed line, applying any state change to `registry`.
    ///
    /// A recognized line naming a box the registry does not know is still
    /// reported as recognized; the caller decides how to surface that.
    ///
    /// # Errors
    ///
    /// Fails only on broken invariants: a duplicate box in a discovery line,
    /// or an analogue command type outside the known set.
    pub fn classify(
        &self,
        line: &str,
        lookback: &Lookback,
        registry: &mut BoxRegistry,
        now: Timestamp,
    ) -> Result<Classification, SlingError> {
        if line.is_empty() {
            return Ok(Classification::unrecognized());
        }
        if line.starts_with(IR_BYTES_MARKER) && lookback.pending_control_message().is_none() {
            warn!(previous = ?lookback, "IR bytes without a preceding control message");
        }

        let ctx = LineContext { line, lookback, now };
        match RULES.iter().find(|rule| (rule.matches)(&ctx, registry)) {
            Some(rule) => {
                debug!(rule = rule.name, "line matched");
                (rule.apply)(self, &ctx, registry)
            }
            None => Ok(Classification::unrecognized()),
        }
    }

    fn discover(
        &self,
        ctx: &LineContext<'_>,
        registry: &mut BoxRegistry,
    ) -> Result<Classification, SlingError> {
        for (id, name) in roster_pairs(ctx.line) {
            registry.add_box(&name, &id)?;
            debug!(box_name = %name, box_id = %id, "box discovered");
        }
        Ok(Classification::silent())
    }

    fn analogue_channel(
        &self,
        ctx: &LineContext<'_>,
        registry: &mut BoxRegistry,
    ) -> Result<Classification, SlingError> {
        let Some(parsed) = self.interpreter.parse_analogue(ctx.line) else {
            debug!(line = ctx.line, "unparsable analogue channel line");
            return Ok(Classification::unrecognized());
        };
        if parsed.box_name.is_empty() {
            return Ok(Classification::unrecognized());
        }
        if registry.contains(&parsed.box_name) {
            let command = self
                .interpreter
                .resolve_analogue(parsed.command_type, parsed.channel)?;
            self.interpreter
                .apply(registry, &parsed.box_name, command, ctx.now);
            debug!(
                box_name = %parsed.box_name,
                channel = parsed.channel,
                user_ip = %parsed.origin_ip,
                "analogue channel changed"
            );
        }
        Ok(Classification::recognized(
            BoxAction::ChannelChanged,
            parsed.box_name,
        ))
    }

    fn start_channel(
        &self,
        ctx: &LineContext<'_>,
        registry: &mut BoxRegistry,
    ) -> Result<Classification, SlingError> {
        let Some(box_name) = token_name(ctx.line, 2) else {
            return Ok(Classification::unrecognized());
        };
        let raw = ctx
            .line
            .rsplit(START_CHANNEL_MARKER)
            .next()
            .unwrap_or_default()
            .trim();
        let Some(channel) = parse_start_channel(raw) else {
            debug!(line = ctx.line, "unparsable start channel");
            return Ok(Classification::unrecognized());
        };
        let analogue = registry.get(&box_name).map(|sb| sb.is_analogue());
        self.interpreter.apply(
            registry,
            &box_name,
            ChannelCommand::ChangeChannel(channel),
            ctx.now,
        );
        debug!(%box_name, channel, ?analogue, "start channel applied");
        Ok(Classification::recognized(BoxAction::ChannelChanged, box_name))
    }

    fn digits_confirmed(
        &self,
        ctx: &LineContext<'_>,
        registry: &mut BoxRegistry,
    ) -> Result<Classification, SlingError> {
        let Some(box_name) = first_token_name(ctx.line) else {
            return Ok(Classification::unrecognized());
        };
        let pending = ctx.lookback.pending_digits().unwrap_or_default();
        let Some(command) = self.interpreter.decode_digital(pending) else {
            debug!(pending, "undecodable digital command");
            return Ok(Classification::unrecognized());
        };
        Ok(self.apply_digital(registry, box_name, command, ctx.now))
    }

    fn ir_bytes(
        &self,
        ctx: &LineContext<'_>,
        registry: &mut BoxRegistry,
    ) -> Result<Classification, SlingError> {
        let box_name = ctx.lookback.pending_control_message().unwrap_or_default();
        if box_name.is_empty() {
            return Ok(Classification::unrecognized());
        }
        let Some(command) = self.interpreter.decode_ir_bytes(ctx.line) else {
            debug!(line = ctx.line, "undecodable IR bytes");
            return Ok(Classification::unrecognized());
        };
        Ok(self.apply_digital(registry, box_name.to_string(), command, ctx.now))
    }

    fn ir_keycode(
        &self,
        ctx: &LineContext<'_>,
        registry: &mut BoxRegistry,
    ) -> Result<Classification, SlingError> {
        let Some(box_name) = token_name(ctx.line, 2) else {
            return Ok(Classification::unrecognized());
        };
        let Some(command) = self.interpreter.decode_digital(ctx.line) else {
            debug!(line = ctx.line, "unknown IR keycode");
            return Ok(Classification::unrecognized());
        };
        Ok(self.apply_digital(registry, box_name, command, ctx.now))
    }

    fn streaming(
        &self,
        ctx: &LineContext<'_>,
        registry: &mut BoxRegistry,
    ) -> Result<Classification, SlingError> {
        let line = if ctx.line.starts_with('.') {
            ctx.line.replace('.', "")
        } else {
            ctx.line.to_string()
        };
        Ok(heartbeat(registry, first_token_name(&line), Some(ctx.now)))
    }

    fn clients(
        &self,
        ctx: &LineContext<'_>,
        registry: &mut BoxRegistry,
    ) -> Result<Classification, SlingError> {
        Ok(heartbeat(registry, token_name(ctx.line, 1), Some(ctx.now)))
    }

    fn stopped(
        &self,
        ctx: &LineContext<'_>,
        registry: &mut BoxRegistry,
    ) -> Result<Classification, SlingError> {
        let line = ctx.line.replace('.', "");
        Ok(heartbeat(registry, first_token_name(&line), None))
    }

    fn apply_digital(
        &self,
        registry: &mut BoxRegistry,
        box_name: String,
        command: ChannelCommand,
        now: Timestamp,
    ) -> Classification {
        if self.interpreter.apply(registry, &box_name, command, now).is_some() {
            debug!(%box_name, ?command, "digital channel changed");
        }
        Classification::recognized(BoxAction::ChannelChanged, box_name)
    }
}

/// Set or clear the heartbeat of the named box.
fn heartbeat(
    registry: &mut BoxRegistry,
    box_name: Option<String>,
    at: Option<Timestamp>,
) -> Classification {
    let Some(box_name) = box_name else {
        return Classification::unrecognized();
    };
    registry.update_box(&box_name, |sb| sb.set_heartbeat(at));
    let action = if at.is_some() {
        BoxAction::StreamingInProgress
    } else {
        BoxAction::StreamingStopped
    };
    Classification::recognized(action, box_name)
}

/// Event-only rules: no state change, just the box name.
fn report(line: &str, index: usize, action: BoxAction) -> Classification {
    match token_name(line, index) {
        Some(box_name) => Classification::recognized(action, box_name),
        None => Classification::unrecognized(),
    }
}

/// `(id, name)` pairs from a roster line such as
/// `BOXES [('sb1', 'slingbox1'), ('sb2', 'slingbox2')]`.
fn roster_pairs(line: &str) -> Vec<(String, String)> {
    let body = line.strip_prefix(DISCOVERY_PREFIX).unwrap_or(line);
    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, ']' | '\'' | '"'))
        .collect();

    cleaned
        .split(['(', ')'])
        .filter_map(|pair| {
            let parts: Vec<&str> = pair
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect();
            match parts.as_slice() {
                [id, name] => Some(((*id).to_string(), (*name).to_string())),
                _ => None,
            }
        })
        .collect()
}

/// Parse a start channel, removing dots only when the raw text is not
/// already a number.
fn parse_start_channel(raw: &str) -> Option<i32> {
    if raw.is_empty() {
        return None;
    }
    raw.parse()
        .ok()
        .or_else(|| raw.replace('.', "").parse().ok())
}

fn first_token_name(line: &str) -> Option<String> {
    token_name(line, 0)
}

/// Whitespace token `index` with dots removed.
///
/// The line must have at least two tokens, and more when `index` requires it.
fn token_name(line: &str, index: usize) -> Option<String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < (index + 1).max(2) {
        return None;
    }
    let name = tokens[index].replace('.', "");
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slingwatch_domain::error::InvariantError;
    use slingwatch_domain::sling_box::NO_CHANNEL;
    use slingwatch_domain::time::now;

    const ROSTER: &str = "BOXES [('sb1', 'slingbox1'), ('sb2', 'slingbox2'), ('sb3', 'slingbox3')]";

    fn registry() -> BoxRegistry {
        let mut registry = BoxRegistry::new();
        LineClassifier::default()
            .classify(ROSTER, &Lookback::Idle, &mut registry, now())
            .unwrap();
        registry
    }

    /// Feed lines through the classifier the way the reader does.
    fn feed(registry: &mut BoxRegistry, lines: &[&str]) -> Vec<Classification> {
        let classifier = LineClassifier::default();
        let mut lookback = Lookback::Idle;
        lines
            .iter()
            .map(|line| {
                let result = classifier
                    .classify(line, &lookback, registry, now())
                    .unwrap();
                lookback.advance(line);
                result
            })
            .collect()
    }

    fn channels(registry: &BoxRegistry, name: &str) -> (i32, i32) {
        let sb = registry.get(name).unwrap();
        (sb.current_channel(), sb.last_channel())
    }

    #[test]
    fn should_populate_registry_from_roster_in_order() {
        let registry = registry();
        let names: Vec<_> = registry.iter().map(|sb| sb.name().to_string()).collect();
        assert_eq!(names, ["slingbox1", "slingbox2", "slingbox3"]);
        assert_eq!(registry.get("slingbox2").unwrap().id(), "sb2");
    }

    #[test]
    fn should_ignore_second_roster_when_registry_populated() {
        let mut registry = registry();
        let results = feed(&mut registry, &["BOXES [('sb9', 'slingbox9')]"]);
        assert!(!results[0].recognized);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn should_tolerate_roster_quoting_variants() {
        let mut registry = BoxRegistry::new();
        feed(&mut registry, &[r#"BOXES [ ( "sb1" , "slingbox1" ),('sb2','slingbox2') ]"#]);
        let names: Vec<_> = registry.iter().map(|sb| sb.name().to_string()).collect();
        assert_eq!(names, ["slingbox1", "slingbox2"]);
    }

    #[test]
    fn should_fail_hard_when_roster_repeats_a_name() {
        let mut registry = BoxRegistry::new();
        let err = LineClassifier::default()
            .classify(
                "BOXES [('sb1', 'slingbox1'), ('sb2', 'slingbox1')]",
                &Lookback::Idle,
                &mut registry,
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, SlingError::Invariant(InvariantError::DuplicateBox { .. })));
    }

    #[test]
    fn should_track_analogue_channel_history() {
        let mut registry = registry();
        registry.set_analogue("slingbox2", true).unwrap();
        let prefix = "07/10/2023, 14:34:21.164  slingbox2 got ProHD";

        feed(&mut registry, &[&format!("{prefix} 2.0.0 192.168.1.10")]);
        assert_eq!(channels(&registry, "slingbox2"), (0, NO_CHANNEL));

        feed(&mut registry, &[&format!("{prefix} 2.1.0 192.168.1.10")]);
        assert_eq!(channels(&registry, "slingbox2"), (1, 0));

        feed(&mut registry, &[&format!("{prefix} 0.0.0 192.168.1.10")]);
        assert_eq!(channels(&registry, "slingbox2"), (2, 1));

        feed(&mut registry, &[&format!("{prefix} 1.0.0 192.168.1.10")]);
        assert_eq!(channels(&registry, "slingbox2"), (1, 2));

        feed(&mut registry, &[&format!("{prefix} 1.0.0 192.168.1.10")]);
        assert_eq!(channels(&registry, "slingbox2"), (0, 1));

        feed(&mut registry, &[&format!("{prefix} 1.0.0 192.168.1.10")]);
        assert_eq!(channels(&registry, "slingbox2"), (0, 1));

        feed(&mut registry, &[&format!("{prefix} 3.0.0 192.168.1.10")]);
        assert_eq!(channels(&registry, "slingbox2"), (1, 0));
    }

    #[test]
    fn should_not_step_down_below_zero_from_start() {
        let mut registry = registry();
        let prefix = "07/10/2023, 14:34:21.164  slingbox1 got ProHD";
        feed(
            &mut registry,
            &[
                &format!("{prefix} 2.0.0 192.168.1.10"),
                &format!("{prefix} 1.0.0 192.168.1.10"),
            ],
        );
        assert_eq!(channels(&registry, "slingbox1"), (0, NO_CHANNEL));
    }

    #[test]
    fn should_not_recognize_analogue_line_with_text_channel() {
        let mut registry = registry();
        let results = feed(
            &mut registry,
            &["07/10/2023, 14:34:21.164  slingbox2 got ProHD 2.abc.0 192.168.1.10"],
        );
        assert!(!results[0].recognized);
        assert_eq!(channels(&registry, "slingbox2"), (NO_CHANNEL, NO_CHANNEL));
    }

    #[test]
    fn should_fail_hard_on_unknown_analogue_command_type() {
        let mut registry = registry();
        let err = LineClassifier::default()
            .classify(
                "07/10/2023, 14:34:21.164  slingbox2 got ProHD 9.4.0 192.168.1.10",
                &Lookback::Idle,
                &mut registry,
                now(),
            )
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(channels(&registry, "slingbox2"), (NO_CHANNEL, NO_CHANNEL));
    }

    #[test]
    fn should_apply_start_channel_for_both_tuner_kinds() {
        let mut registry = registry();
        registry.set_analogue("slingbox1", true).unwrap();
        let results = feed(
            &mut registry,
            &[
                ".12/11/2023, 13:35:28.949  slingbox1 Sending Start Channel 155",
                ".12/11/2023, 13:35:28.949  slingbox2 Sending Start Channel 821",
            ],
        );
        assert_eq!(results[0].action, BoxAction::ChannelChanged);
        assert_eq!(channels(&registry, "slingbox1").0, 155);
        assert_eq!(channels(&registry, "slingbox2").0, 821);
    }

    #[test]
    fn should_strip_dots_from_start_channel_only_when_needed() {
        assert_eq!(parse_start_channel("155"), Some(155));
        assert_eq!(parse_start_channel("1.55"), Some(155));
        assert_eq!(parse_start_channel("abc"), None);
        assert_eq!(parse_start_channel(""), None);
    }

    #[test]
    fn should_track_digital_channel_commands() {
        let mut registry = registry();

        feed(
            &mut registry,
            &["Sending Channel Digits 1111", "slingbox2 Got Streamer Control Message IR"],
        );
        assert_eq!(channels(&registry, "slingbox2").0, 1111);

        feed(
            &mut registry,
            &["10/31/2023, 17:05:01.734  slingbox2 Sending IR keycode 4 1 for 192.168.1.10"],
        );
        assert_eq!(channels(&registry, "slingbox2"), (1112, 1111));

        feed(
            &mut registry,
            &["10/31/2023, 17:07:56.360  slingbox2 Sending IR keycode 5 1 for 192.168.1.10"],
        );
        assert_eq!(channels(&registry, "slingbox2"), (1111, 1112));

        feed(
            &mut registry,
            &["10/31/2023, 17:09:13.031  slingbox2 Sending IR keycode 56 1 for 192.168.1.10"],
        );
        assert_eq!(channels(&registry, "slingbox2"), (1112, 1111));
    }

    #[test]
    fn should_keep_highest_channel_when_stepping_up() {
        let mut registry = registry();

        feed(
            &mut registry,
            &[
                "Sending Channel Digits 2147483647",
                "slingbox2 Got Streamer Control Message IR",
                "10/31/2023, 17:05:01.734  slingbox2 Sending IR keycode 4 1 for 192.168.1.10",
            ],
        );

        assert_eq!(channels(&registry, "slingbox2").0, i32::MAX);
    }

    #[test]
    fn should_correlate_digits_across_noise_lines() {
        let mut registry = registry();
        let results = feed(
            &mut registry,
            &[
                "Sending Channel Digits 1111",
                "GET /slingbox2 HTTP/1.1",
                "Remote Control Connected",
                "10.0.0.4 RemoteControl connection from 10.0.0.4",
                "slingbox2 Got Streamer Control Message IR",
            ],
        );
        assert_eq!(results[4].action, BoxAction::ChannelChanged);
        assert_eq!(channels(&registry, "slingbox2").0, 1111);
    }

    #[test]
    fn should_drop_correlation_when_other_line_intervenes() {
        let mut registry = registry();
        let results = feed(
            &mut registry,
            &[
                "Sending Channel Digits 1111",
                "slingbox2 Selecting Video Source 0",
                "slingbox2 Got Streamer Control Message IR",
            ],
        );
        assert_eq!(results[2].action, BoxAction::StreamingInProgress);
        assert_eq!(channels(&registry, "slingbox2").0, NO_CHANNEL);
    }

    #[test]
    fn should_decode_ir_bytes_after_control_message() {
        let mut registry = registry();
        let results = feed(
            &mut registry,
            &[
                "slingbox3 Got Streamer Control Message IR",
                r"IR [b'\t192.168.1.127', b'\n192.168.1.127', b'\x0b192.168.1.127', b'\x0c192.168.1.127']",
            ],
        );
        assert_eq!(
            results[1],
            Classification::recognized(BoxAction::ChannelChanged, "slingbox3")
        );
        assert_eq!(channels(&registry, "slingbox3").0, 1234);
    }

    #[test]
    fn should_leave_channel_alone_when_ir_bytes_invalid() {
        let mut registry = registry();
        let results = feed(
            &mut registry,
            &[
                "slingbox3 Got Streamer Control Message IR",
                r"IR [b'\x11192.168.1.127', b'\*****12192.168.1.127']",
            ],
        );
        assert!(!results[1].recognized);
        assert_eq!(channels(&registry, "slingbox3").0, NO_CHANNEL);
    }

    #[test]
    fn should_not_decode_ir_bytes_without_control_message() {
        let mut registry = registry();
        let results = feed(&mut registry, &[r"IR [b'\t192.168.1.127']"]);
        assert!(!results[0].recognized);
    }

    #[test]
    fn should_refresh_heartbeat_on_streaming_phrases() {
        for line in [
            "slingbox1 Selecting Video Source 0",
            "...slingbox1 Got Streamer Control Message ProHD",
            "slingbox1 New Stream Starting 0",
            "slingbox1 Stream started at 08/23/2023, 21:52:29.921  732 0",
        ] {
            let mut registry = registry();
            let results = feed(&mut registry, &[line]);
            assert_eq!(
                results[0],
                Classification::recognized(BoxAction::StreamingInProgress, "slingbox1"),
                "{line}"
            );
            assert!(registry.get("slingbox1").unwrap().last_heartbeat().is_some());
        }
    }

    #[test]
    fn should_read_clients_line_name_from_second_token() {
        let mut registry = registry();
        let results = feed(
            &mut registry,
            &[".....08/22/2023,22:11:54 slingbox2 1 Clients.192.168.1.10:63984"],
        );
        assert_eq!(
            results[0],
            Classification::recognized(BoxAction::StreamingInProgress, "slingbox2")
        );
        assert!(registry.get("slingbox2").unwrap().is_streaming(now()));
    }

    #[test]
    fn should_clear_heartbeat_when_stopped() {
        for line in [
            "slingbox2 Shutting down connections",
            "slingbox2 Logging Out",
            ".slingbox2 Giving up. Sorry...",
        ] {
            let mut registry = registry();
            registry.set_heartbeat("slingbox2", Some(now())).unwrap();
            let results = feed(&mut registry, &[line]);
            assert_eq!(results[0].action, BoxAction::StreamingStopped, "{line}");
            assert!(!registry.get("slingbox2").unwrap().is_streaming(now()));
        }
    }

    #[test]
    fn should_report_fault_and_lock_without_mutation() {
        let mut registry = registry();
        let before = registry.clone();
        let results = feed(
            &mut registry,
            &[
                "slingbox2 Error Starting Session. Slingbox might be Bricked",
                "slingbox2 Ignoring IR request from 192.168.1.121 Remote Locked by 192.168.1.10",
            ],
        );
        assert_eq!(results[0], Classification::recognized(BoxAction::Faulted, "slingbox2"));
        assert_eq!(
            results[1],
            Classification::recognized(BoxAction::RemoteLocked, "slingbox2")
        );
        assert_eq!(registry, before);
    }

    #[test]
    fn should_report_unknown_box_as_recognized_without_mutation() {
        let mut registry = registry();
        let before = registry.clone();
        let results = feed(&mut registry, &["ghost Logging Out"]);
        assert_eq!(
            results[0],
            Classification::recognized(BoxAction::StreamingStopped, "ghost")
        );
        assert_eq!(registry, before);
    }

    #[test]
    fn should_not_recognize_when_name_token_missing() {
        let mut registry = registry();
        let results = feed(&mut registry, &[".Clients", "...Logging Out"]);
        assert!(!results[0].recognized);
        assert_eq!(
            results[1],
            Classification::recognized(BoxAction::StreamingStopped, "Logging")
        );
        assert!(!feed(&mut registry, &["Sending Start Channel"])[0].recognized);
    }

    #[test]
    fn should_leave_unmatched_lines_unrecognized() {
        let mut registry = registry();
        let results = feed(&mut registry, &["Welcome to the slinger server", ""]);
        assert_eq!(results, [Classification::unrecognized(), Classification::unrecognized()]);
    }

    #[test]
    fn should_keep_lookback_on_noise_lines() {
        let mut lookback = Lookback::Idle;
        lookback.advance("Sending Channel Digits 42");
        lookback.advance("GET /favicon.ico");
        assert_eq!(
            lookback,
            Lookback::AwaitingConfirmation(Pending::Digits("Sending Channel Digits 42".to_string()))
        );
        lookback.advance("slingbox1 Got Streamer Control Message IR");
        assert_eq!(
            lookback,
            Lookback::AwaitingConfirmation(Pending::ControlMessage {
                box_name: "slingbox1".to_string()
            })
        );
        lookback.advance("anything else");
        assert_eq!(lookback, Lookback::Idle);
    }

    #[test]
    fn should_try_rules_in_documented_order() {
        let names: Vec<_> = LineClassifier::rule_names().collect();
        assert_eq!(
            names,
            [
                "discovery",
                "analogue_channel",
                "start_channel",
                "digits_confirmed",
                "ir_bytes",
                "ir_keycode",
                "streaming",
                "clients",
                "stopped",
                "faulted",
                "remote_locked",
            ]
        );
    }

    #[test]
    fn should_prefer_digits_confirmation_over_streaming_phrase() {
        let registry = registry();
        let pending =
            Lookback::AwaitingConfirmation(Pending::Digits("Sending Channel Digits 7".into()));
        let line = "slingbox1 Got Streamer Control Message IR";
        assert_eq!(
            LineClassifier::matching_rule(line, &pending, &registry),
            Some("digits_confirmed")
        );
        assert_eq!(
            LineClassifier::matching_rule(line, &Lookback::Idle, &registry),
            Some("streaming")
        );
    }
}
