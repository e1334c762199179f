//! Channel command decoding.
//!
//! Three encodings show up in the console:
//! - analogue tuners log a dotted `type.channel.subcode` triple,
//! - digital tuners log either the digits typed, a named button
//!   (`Remote Ch+`, `sending key 4 ...`, `Sending IR keycode 4 ...`),
//! - or only the raw IR bytes, one escaped byte per digit, which have to be
//!   mapped back through the box's digit alphabet.

use slingwatch_domain::error::InvariantError;
use slingwatch_domain::registry::BoxRegistry;
use slingwatch_domain::sling_box::SlingBox;
use slingwatch_domain::time::Timestamp;

use crate::remote_codes::RemoteCodes;

const CHANGE_CHANNEL_PREFIX: &str = "Sending Channel Digits";
const IR_BYTES_PREFIX: &str = "IR [b'";

/// Escaped IR byte prefix for each decimal digit. Order matters: the first
/// matching prefix wins.
const IR_DIGITS: [(&str, char); 10] = [
    ("x12", '0'),
    ("t", '1'),
    ("n", '2'),
    ("x0b", '3'),
    ("x0c", '4'),
    ("r", '5'),
    ("x0e", '6'),
    ("x0f", '7'),
    ("x10", '8'),
    ("x11", '9'),
];

/// A decoded remote-control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCommand {
    ChannelUp,
    ChannelDown,
    ChangeChannel(i32),
    SelectLastChannel,
}

impl ChannelCommand {
    /// Apply to a box. Returns whether its state changed.
    pub fn apply(self, sling_box: &mut SlingBox, now: Timestamp) -> bool {
        match self {
            Self::ChannelUp => sling_box.channel_up(now),
            Self::ChannelDown => sling_box.channel_down(now),
            Self::ChangeChannel(channel) => sling_box.change_channel(channel, now),
            Self::SelectLastChannel => sling_box.select_last_channel(now),
        }
    }
}

/// Command type carried by the first element of an analogue triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalogueCommandType {
    ChannelUp = 0,
    ChannelDown = 1,
    ChangeChannel = 2,
    LastChannel = 3,
}

impl TryFrom<i32> for AnalogueCommandType {
    type Error = InvariantError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::ChannelUp),
            1 => Ok(Self::ChannelDown),
            2 => Ok(Self::ChangeChannel),
            3 => Ok(Self::LastChannel),
            other => Err(InvariantError::UnknownCommandType(other)),
        }
    }
}

impl AnalogueCommandType {
    #[must_use]
    pub fn into_command(self, channel: i32) -> ChannelCommand {
        match self {
            Self::ChannelUp => ChannelCommand::ChannelUp,
            Self::ChannelDown => ChannelCommand::ChannelDown,
            Self::ChangeChannel => ChannelCommand::ChangeChannel(channel),
            Self::LastChannel => ChannelCommand::SelectLastChannel,
        }
    }
}

/// Fields of a `got ProHD` line.
///
/// `07/10/2023, 14:34:21.164  slingbox2 got ProHD 2.0.0 192.168.1.10`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalogueLine {
    pub box_name: String,
    /// Raw command type; validated by [`CommandInterpreter::resolve_analogue`].
    pub command_type: i32,
    pub channel: i32,
    pub origin_ip: String,
}

/// Log prefixes identifying one named remote button.
#[derive(Debug, Clone)]
struct NamedButton {
    spoken: &'static str,
    key: String,
    keycode: String,
}

impl NamedButton {
    fn new(spoken: &'static str, code: u32) -> Self {
        Self {
            spoken,
            key: format!("sending key {code} "),
            keycode: format!("Sending IR keycode {code} "),
        }
    }

    fn matches(&self, line: &str) -> bool {
        line.starts_with(self.spoken) || line.starts_with(&self.key) || line.contains(&self.keycode)
    }
}

/// Decodes channel commands from console fragments and applies them.
#[derive(Debug, Clone)]
pub struct CommandInterpreter {
    codes: RemoteCodes,
    channel_up: NamedButton,
    channel_down: NamedButton,
    last_channel: NamedButton,
}

impl Default for CommandInterpreter {
    fn default() -> Self {
        Self::new(RemoteCodes::default())
    }
}

impl CommandInterpreter {
    #[must_use]
    pub fn new(codes: RemoteCodes) -> Self {
        Self {
            codes,
            channel_up: NamedButton::new("Remote Ch+", codes.channel_up()),
            channel_down: NamedButton::new("Remote Ch-", codes.channel_down()),
            last_channel: NamedButton::new("Remote Last", codes.last_channel()),
        }
    }

    #[must_use]
    pub fn codes(&self) -> RemoteCodes {
        self.codes
    }

    /// Split a `got ProHD` line into its positional fields.
    ///
    /// Returns `None` when the line has fewer than seven tokens, the triple has
    /// fewer than three parts, or either number does not parse.
    #[must_use]
    pub fn parse_analogue(&self, line: &str) -> Option<AnalogueLine> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 7 {
            return None;
        }
        let box_name = tokens[2].replace('.', "");
        let mut parts = tokens[5].split('.');
        let command_type = parts.next()?.parse().ok()?;
        let channel = parts.next()?.parse().ok()?;
        parts.next()?;
        Some(AnalogueLine {
            box_name,
            command_type,
            channel,
            origin_ip: tokens[6].to_string(),
        })
    }

    /// Turn a raw analogue command type into a command.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError::UnknownCommandType`] for anything outside 0..=3.
    pub fn resolve_analogue(
        &self,
        command_type: i32,
        channel: i32,
    ) -> Result<ChannelCommand, InvariantError> {
        AnalogueCommandType::try_from(command_type).map(|kind| kind.into_command(channel))
    }

    /// Decode a digital fragment: typed digits or a named button.
    #[must_use]
    pub fn decode_digital(&self, line: &str) -> Option<ChannelCommand> {
        if let Some(digits) = line.strip_prefix(CHANGE_CHANNEL_PREFIX) {
            if let Ok(channel) = digits.trim().parse() {
                return Some(ChannelCommand::ChangeChannel(channel));
            }
        }
        if self.channel_up.matches(line) {
            Some(ChannelCommand::ChannelUp)
        } else if self.channel_down.matches(line) {
            Some(ChannelCommand::ChannelDown)
        } else if self.last_channel.matches(line) {
            Some(ChannelCommand::SelectLastChannel)
        } else {
            None
        }
    }

    /// Decode an `IR [b'...', ...]` line into a channel change.
    #[must_use]
    pub fn decode_ir_bytes(&self, line: &str) -> Option<ChannelCommand> {
        decode_ir_digits(line).map(ChannelCommand::ChangeChannel)
    }

    /// Apply `command` to the named box.
    ///
    /// Returns `None` for an unknown box, otherwise whether the box changed.
    pub fn apply(
        &self,
        registry: &mut BoxRegistry,
        box_name: &str,
        command: ChannelCommand,
        now: Timestamp,
    ) -> Option<bool> {
        registry.update_box(box_name, |sb| command.apply(sb, now))
    }
}

/// Map escaped IR bytes back to the channel number they spell.
///
/// Each comma-separated token is stripped of non-printable characters and
/// matched by prefix against the digit alphabet. The first token that matches
/// nothing fails the whole decode, as does a result that is not an `i32`.
#[must_use]
pub fn decode_ir_digits(line: &str) -> Option<i32> {
    if !line.starts_with(IR_BYTES_PREFIX) {
        return None;
    }
    let cleaned = line
        .replace("IR [", "")
        .replace(']', "")
        .replace("b'\\", "")
        .replace('\'', "");

    let mut digits = String::new();
    for token in cleaned.trim().split(',').filter(|token| !token.is_empty()) {
        let printable: String = token.chars().filter(|c| (' '..='~').contains(c)).collect();
        let printable = printable.trim();
        let (_, digit) = IR_DIGITS
            .iter()
            .find(|(prefix, _)| printable.starts_with(prefix))?;
        digits.push(*digit);
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use slingwatch_domain::sling_box::NO_CHANNEL;
    use slingwatch_domain::time::now;

    fn interpreter() -> CommandInterpreter {
        CommandInterpreter::default()
    }

    #[test]
    fn should_parse_analogue_fields() {
        let line = "07/10/2023, 14:34:21.164  slingbox2 got ProHD 2.17.0 192.168.1.10";
        let parsed = interpreter().parse_analogue(line).unwrap();
        assert_eq!(parsed.box_name, "slingbox2");
        assert_eq!(parsed.command_type, 2);
        assert_eq!(parsed.channel, 17);
        assert_eq!(parsed.origin_ip, "192.168.1.10");
    }

    #[test]
    fn should_reject_analogue_line_when_channel_not_numeric() {
        let line = "07/10/2023, 14:34:21.164  slingbox2 got ProHD 2.x.0 192.168.1.10";
        assert!(interpreter().parse_analogue(line).is_none());
    }

    #[test]
    fn should_reject_analogue_line_when_too_short() {
        assert!(interpreter().parse_analogue("slingbox2 got ProHD 2.0.0").is_none());
    }

    #[test]
    fn should_reject_analogue_triple_with_two_parts() {
        let line = "07/10/2023, 14:34:21.164  slingbox2 got ProHD 2.0 192.168.1.10";
        assert!(interpreter().parse_analogue(line).is_none());
    }

    #[test]
    fn should_map_analogue_command_types() {
        let interp = interpreter();
        assert_eq!(interp.resolve_analogue(0, 9), Ok(ChannelCommand::ChannelUp));
        assert_eq!(interp.resolve_analogue(1, 9), Ok(ChannelCommand::ChannelDown));
        assert_eq!(interp.resolve_analogue(2, 9), Ok(ChannelCommand::ChangeChannel(9)));
        assert_eq!(interp.resolve_analogue(3, 9), Ok(ChannelCommand::SelectLastChannel));
    }

    #[test]
    fn should_fail_hard_on_unknown_analogue_command_type() {
        assert_eq!(
            interpreter().resolve_analogue(7, 1),
            Err(InvariantError::UnknownCommandType(7))
        );
    }

    #[test]
    fn should_decode_typed_digits() {
        assert_eq!(
            interpreter().decode_digital("Sending Channel Digits 1111"),
            Some(ChannelCommand::ChangeChannel(1111))
        );
    }

    #[test]
    fn should_decode_named_buttons_in_all_forms() {
        let interp = interpreter();
        assert_eq!(interp.decode_digital("Remote Ch+ 4"), Some(ChannelCommand::ChannelUp));
        assert_eq!(interp.decode_digital("sending key 5 1"), Some(ChannelCommand::ChannelDown));
        assert_eq!(
            interp.decode_digital("10/31/2023, 17:09:13.031  slingBox2 Sending IR keycode 56 1 for 192.168.1.10"),
            Some(ChannelCommand::SelectLastChannel)
        );
    }

    #[test]
    fn should_not_confuse_codes_sharing_a_prefix() {
        let line = "10/31/2023, 17:05:01.734  slingBox2 Sending IR keycode 45 1 for 192.168.1.10";
        assert_eq!(interpreter().decode_digital(line), None);
    }

    #[test]
    fn should_use_injected_codes() {
        let interp = CommandInterpreter::new(RemoteCodes::new(14, 15, 66).unwrap());
        assert_eq!(interp.decode_digital("sending key 14 1"), Some(ChannelCommand::ChannelUp));
        assert_eq!(interp.decode_digital("sending key 4 1"), None);
        assert_eq!(
            interpreter().decode_digital("sending key 4 1"),
            Some(ChannelCommand::ChannelUp)
        );
    }

    #[test]
    fn should_decode_ir_bytes_one_to_four() {
        let line = r"IR [b'\t192.168.1.127', b'\n192.168.1.127', b'\x0b192.168.1.127', b'\x0c192.168.1.127']";
        assert_eq!(decode_ir_digits(line), Some(1234));
    }

    #[test]
    fn should_decode_ir_bytes_five_to_eight() {
        let line = r"IR [b'\r192.168.1.127', b'\x0e192.168.1.127', b'\x0f192.168.1.127', b'\x10192.168.1.127']";
        assert_eq!(decode_ir_digits(line), Some(5678));
    }

    #[test]
    fn should_decode_ir_bytes_nine_and_zero() {
        let line = r"IR [b'\x11192.168.1.127', b'\x12192.168.1.127']";
        assert_eq!(decode_ir_digits(line), Some(90));
    }

    #[test]
    fn should_fail_ir_decode_on_unmatched_token() {
        let line = r"IR [b'\x11192.168.1.127', b'\*****12192.168.1.127']";
        assert_eq!(decode_ir_digits(line), None);
    }

    #[test]
    fn should_fail_ir_decode_without_prefix() {
        assert_eq!(decode_ir_digits(r"[b'\t192.168.1.127']"), None);
        assert_eq!(decode_ir_digits("IR []"), None);
    }

    #[test]
    fn should_fail_ir_decode_when_number_overflows() {
        let token = r"b'\x11192.168.1.127'";
        let line = format!("IR [{}]", vec![token; 12].join(", "));
        assert_eq!(decode_ir_digits(&line), None);
    }

    #[test]
    fn should_apply_to_named_box_only() {
        let mut registry = BoxRegistry::new();
        registry.add_box("slingbox1", "sb1").unwrap();
        let interp = interpreter();

        let changed = interp.apply(
            &mut registry,
            "slingbox1",
            ChannelCommand::ChangeChannel(12),
            now(),
        );
        assert_eq!(changed, Some(true));
        assert_eq!(
            interp.apply(&mut registry, "ghost", ChannelCommand::ChannelUp, now()),
            None
        );
        let sb = registry.get("slingbox1").unwrap();
        assert_eq!((sb.current_channel(), sb.last_channel()), (12, NO_CHANNEL));
    }
}
