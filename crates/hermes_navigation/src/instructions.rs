use hermes_routing::{
    profile::RouteProfile,
    route::Route,
    turn::{RoundaboutState, TurnType},
};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{navigation_state::NavigationState, navigator_turn::NavigatorTurn};

/// A following turn this close is announced together with the current one.
pub const IMMEDIATE_TURN_DISTANCE: f64 = 50.0;
/// Turns nearer than this are announced without a distance.
const ANNOUNCE_DISTANCE_THRESHOLD: f64 = 10.0;

const METERS_PER_YARD: f64 = 0.9144;
const YARDS_PER_MILE: f64 = 1760.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Locale {
    #[default]
    En,
    Fr,
    De,
}

impl Locale {
    /// The locale for a tag such as `fr`, `de_CH` or `en-GB`. Unsupported
    /// languages fall back to English.
    pub fn from_tag(tag: &str) -> Locale {
        let language = tag.split(['_', '-']).next().unwrap_or_default();
        language.parse().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstructionOptions {
    pub locale: Locale,
    pub metric: bool,
    /// Abbreviate units.
    pub abbreviate: bool,
}

impl Default for InstructionOptions {
    fn default() -> Self {
        InstructionOptions {
            locale: Locale::En,
            metric: true,
            abbreviate: true,
        }
    }
}

/// The words used for one language.
struct Phrases {
    in_distance: &'static str,
    onto: &'static str,
    then_immediately: &'static str,
    start_on: &'static str,
    arrive: &'static str,
    arrived: &'static str,
    turn_round_now: &'static str,
    continue_on: &'static str,
    ahead: &'static str,
    bear_left: &'static str,
    bear_right: &'static str,
    keep_left: &'static str,
    keep_right: &'static str,
    left: &'static str,
    right: &'static str,
    sharp_left: &'static str,
    sharp_right: &'static str,
    around: &'static str,
    roundabout_enter: &'static str,
    roundabout_exit: &'static str,
    roundabout_leave: &'static str,
    roundabout_continue: &'static str,
    decimal_separator: char,
    meters: (&'static str, &'static str),
    kilometers: (&'static str, &'static str),
    yards: (&'static str, &'static str),
    miles: (&'static str, &'static str),
}

const ENGLISH: Phrases = Phrases {
    in_distance: "in {distance}",
    onto: "onto",
    then_immediately: "then immediately",
    start_on: "start on",
    arrive: "arrive at your destination",
    arrived: "you have arrived at your destination",
    turn_round_now: "turn round when possible",
    continue_on: "continue",
    ahead: "continue ahead",
    bear_left: "bear left",
    bear_right: "bear right",
    keep_left: "keep left",
    keep_right: "keep right",
    left: "turn left",
    right: "turn right",
    sharp_left: "turn sharp left",
    sharp_right: "turn sharp right",
    around: "turn round",
    roundabout_enter: "at the roundabout take the {exit} exit",
    roundabout_exit: "take the {exit} exit",
    roundabout_leave: "leave the roundabout",
    roundabout_continue: "continue round the roundabout",
    decimal_separator: '.',
    meters: ("m", "metres"),
    kilometers: ("km", "kilometres"),
    yards: ("yd", "yards"),
    miles: ("mi", "miles"),
};

const FRENCH: Phrases = Phrases {
    in_distance: "dans {distance},",
    onto: "sur",
    then_immediately: "puis immédiatement",
    start_on: "partez sur",
    arrive: "arrivée à destination",
    arrived: "vous êtes arrivé à destination",
    turn_round_now: "faites demi-tour dès que possible",
    continue_on: "continuez",
    ahead: "continuez tout droit",
    bear_left: "serrez à gauche",
    bear_right: "serrez à droite",
    keep_left: "restez à gauche",
    keep_right: "restez à droite",
    left: "tournez à gauche",
    right: "tournez à droite",
    sharp_left: "tournez franchement à gauche",
    sharp_right: "tournez franchement à droite",
    around: "faites demi-tour",
    roundabout_enter: "au rond-point prenez la {exit} sortie",
    roundabout_exit: "prenez la {exit} sortie",
    roundabout_leave: "quittez le rond-point",
    roundabout_continue: "continuez sur le rond-point",
    decimal_separator: ',',
    meters: ("m", "mètres"),
    kilometers: ("km", "kilomètres"),
    yards: ("yd", "yards"),
    miles: ("mi", "milles"),
};

const GERMAN: Phrases = Phrases {
    in_distance: "in {distance}",
    onto: "auf",
    then_immediately: "und dann sofort",
    start_on: "starten Sie auf",
    arrive: "erreichen Sie Ihr Ziel",
    arrived: "Sie haben Ihr Ziel erreicht",
    turn_round_now: "wenn möglich bitte wenden",
    continue_on: "weiterfahren",
    ahead: "geradeaus weiterfahren",
    bear_left: "leicht links halten",
    bear_right: "leicht rechts halten",
    keep_left: "links halten",
    keep_right: "rechts halten",
    left: "links abbiegen",
    right: "rechts abbiegen",
    sharp_left: "scharf links abbiegen",
    sharp_right: "scharf rechts abbiegen",
    around: "wenden",
    roundabout_enter: "im Kreisverkehr die {exit} Ausfahrt nehmen",
    roundabout_exit: "die {exit} Ausfahrt nehmen",
    roundabout_leave: "den Kreisverkehr verlassen",
    roundabout_continue: "im Kreisverkehr bleiben",
    decimal_separator: ',',
    meters: ("m", "Meter"),
    kilometers: ("km", "Kilometer"),
    yards: ("yd", "Yards"),
    miles: ("mi", "Meilen"),
};

impl Locale {
    fn phrases(self) -> &'static Phrases {
        match self {
            Locale::En => &ENGLISH,
            Locale::Fr => &FRENCH,
            Locale::De => &GERMAN,
        }
    }

    fn ordinal(self, number: u32) -> String {
        match self {
            Locale::En => {
                let suffix = match (number % 10, number % 100) {
                    (_, 11..=13) => "th",
                    (1, _) => "st",
                    (2, _) => "nd",
                    (3, _) => "rd",
                    _ => "th",
                };
                format!("{number}{suffix}")
            }
            Locale::Fr if number == 1 => "1re".to_string(),
            Locale::Fr => format!("{number}e"),
            Locale::De => format!("{number}."),
        }
    }
}

fn with_decimal_separator(value: String, separator: char) -> String {
    if separator == '.' {
        value
    } else {
        value.replace('.', &separator.to_string())
    }
}

fn unit(units: (&'static str, &'static str), abbreviate: bool) -> &'static str {
    if abbreviate { units.0 } else { units.1 }
}

/// A distance rounded for speech: tens below a kilometre or a tenth of a
/// mile, tenths above.
pub fn format_distance(meters: f64, options: &InstructionOptions) -> String {
    let phrases = options.locale.phrases();
    let meters = meters.max(0.0);

    if options.metric {
        if meters < 995.0 {
            let rounded = ((meters / 10.0).round() * 10.0).max(10.0);
            format!("{rounded} {}", unit(phrases.meters, options.abbreviate))
        } else {
            let kilometers = format!("{:.1}", meters / 1000.0);
            format!(
                "{} {}",
                with_decimal_separator(kilometers, phrases.decimal_separator),
                unit(phrases.kilometers, options.abbreviate)
            )
        }
    } else {
        let yards = meters / METERS_PER_YARD;
        if yards < YARDS_PER_MILE / 10.0 {
            let rounded = ((yards / 10.0).round() * 10.0).max(10.0);
            format!("{rounded} {}", unit(phrases.yards, options.abbreviate))
        } else {
            let miles = format!("{:.1}", yards / YARDS_PER_MILE);
            format!(
                "{} {}",
                with_decimal_separator(miles, phrases.decimal_separator),
                unit(phrases.miles, options.abbreviate)
            )
        }
    }
}

fn road_label(name: &str, reference: &str) -> Option<String> {
    match (name.is_empty(), reference.is_empty()) {
        (true, true) => None,
        (false, true) => Some(name.to_string()),
        (true, false) => Some(reference.to_string()),
        (false, false) => Some(format!("{name} ({reference})")),
    }
}

/// What to do at the turn, without distance.
fn action(turn: &NavigatorTurn, profile: &RouteProfile, locale: Locale) -> String {
    let phrases = locale.phrases();
    let details = &turn.turn;

    // Travellers free to go either way round get plain turns instead.
    if profile.vehicle.obeys_one_way() {
        match details.roundabout_state {
            RoundaboutState::Enter if details.exit_number > 0 => {
                return phrases
                    .roundabout_enter
                    .replace("{exit}", &locale.ordinal(details.exit_number));
            }
            RoundaboutState::Exit if details.exit_number > 0 => {
                return phrases
                    .roundabout_exit
                    .replace("{exit}", &locale.ordinal(details.exit_number));
            }
            RoundaboutState::Exit => return phrases.roundabout_leave.to_string(),
            RoundaboutState::Continue => return phrases.roundabout_continue.to_string(),
            _ => {}
        }
    }

    let words = match details.turn_type {
        TurnType::None => phrases.continue_on,
        TurnType::Ahead => phrases.ahead,
        TurnType::BearLeft if details.is_fork => phrases.keep_left,
        TurnType::BearRight if details.is_fork => phrases.keep_right,
        TurnType::BearLeft => phrases.bear_left,
        TurnType::BearRight => phrases.bear_right,
        TurnType::Left => phrases.left,
        TurnType::Right => phrases.right,
        TurnType::SharpLeft => phrases.sharp_left,
        TurnType::SharpRight => phrases.sharp_right,
        TurnType::Around => phrases.around,
    };

    match road_label(&turn.to_name, &turn.to_ref) {
        Some(label) => format!("{words} {} {label}", phrases.onto),
        None => words.to_string(),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn with_distance(text: String, distance: f64, options: &InstructionOptions) -> String {
    if distance < ANNOUNCE_DISTANCE_THRESHOLD {
        return text;
    }
    let prefix = options
        .locale
        .phrases()
        .in_distance
        .replace("{distance}", &format_distance(distance, options));
    format!("{prefix} {text}")
}

/// The sentence announcing `turn`. In the arrival state this is the arrival
/// message; a significant `next_turn` close behind is announced with it.
pub fn turn_instructions(
    turn: &NavigatorTurn,
    profile: &RouteProfile,
    options: &InstructionOptions,
    state: NavigationState,
    next_turn: Option<&NavigatorTurn>,
) -> String {
    let phrases = options.locale.phrases();

    let text = match state {
        NavigationState::Arrival => phrases.arrived.to_string(),
        NavigationState::TurnRound => phrases.turn_round_now.to_string(),
        _ if turn.is_arrival() => with_distance(phrases.arrive.to_string(), turn.distance, options),
        _ => {
            let mut text = with_distance(action(turn, profile, options.locale), turn.distance, options);
            let immediate = next_turn.filter(|next| next.is_significant() && next.distance <= IMMEDIATE_TURN_DISTANCE);
            if let Some(next) = immediate {
                text = format!(
                    "{text} {} {}",
                    phrases.then_immediately,
                    action(next, profile, options.locale)
                );
            }
            text
        }
    };

    capitalize(&text)
}

/// Step-by-step directions for the whole route, one sentence per line.
pub fn route_instructions(route: &Route, options: &InstructionOptions) -> String {
    let phrases = options.locale.phrases();
    let profile = route.profile();
    let segments = route.segments();

    let Some(first) = segments.first() else {
        return String::new();
    };

    let mut lines = Vec::new();
    match road_label(&first.name, &first.reference) {
        Some(label) => lines.push(capitalize(&format!("{} {label}", phrases.start_on))),
        None => lines.push(capitalize(phrases.continue_on)),
    }

    let mut distance = first.distance;
    let mut time = first.time;
    for pair in segments.windows(2) {
        let turn = NavigatorTurn::between(&pair[0], Some(&pair[1]), distance, time);
        if turn.is_significant() {
            lines.push(turn_instructions(
                &turn,
                profile,
                options,
                NavigationState::Turn,
                None,
            ));
            distance = 0.0;
            time = 0.0;
        }
        distance += pair[1].distance;
        time += pair[1].time;
    }

    if let Some(last) = segments.last() {
        let arrival = NavigatorTurn::between(last, None, distance, time);
        lines.push(turn_instructions(
            &arrival,
            profile,
            options,
            NavigationState::Turn,
            None,
        ));
    }

    lines.join("\n")
}
