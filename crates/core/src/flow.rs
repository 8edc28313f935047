use serde::Serialize;

use crate::models::{CallStage, Language, MenuOption, Route, TicketRecord, TrainTiming};
use crate::voice::{GatherDirective, VoicePrompt};

pub mod prompts {
    pub const WELCOME: &str =
        "Welcome to IRCTC Railway Enquiry System. Press 1 for English. Press 2 for Hindi.";
    pub const NO_INPUT: &str = "No input received. Goodbye.";
    pub const MAIN_MENU: &str = "Press 1 for PNR Status. \
        Press 2 for Train Running Status. \
        Press 3 for Train Schedule. \
        Press 4 for Ticket Booking Information. \
        Press 5 for Cancellation Policy. \
        Press 9 to repeat this menu. \
        Press 0 to exit.";
    pub const HINDI_UNAVAILABLE: &str = "Hindi option is under development.";
    pub const INVALID_SELECTION: &str = "Invalid selection.";
    pub const INVALID_OPTION: &str = "Invalid option selected.";
    pub const ENTER_PNR: &str = "Please enter your 10 digit PNR number.";
    pub const ENTER_TRAIN: &str = "Please enter your 5 digit train number.";
    pub const BOOKING_INFO: &str = "Tickets can be booked through the IRCTC website or mobile application. \
        Booking opens 120 days before departure.";
    pub const CANCELLATION_POLICY: &str = "Cancellation charges depend on timing. \
        If cancelled more than 48 hours before departure, minimal charges apply.";
    pub const GOODBYE: &str = "Thank you for calling IRCTC. Goodbye.";
    pub const NOT_UNDERSTOOD: &str = "Sorry, I did not understand your request.";
    pub const PNR_NOT_FOUND: &str = "PNR not found.";
    pub const TRAIN_NOT_FOUND: &str = "Train not found.";
    pub const SERVICE_UNAVAILABLE: &str =
        "Sorry, enquiry records are unavailable right now. Please call again later.";
}

pub const PNR_DIGITS: u8 = 10;
pub const TRAIN_NUMBER_DIGITS: u8 = 5;
pub const MENU_DIGITS: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub next: CallStage,
    pub prompt: VoicePrompt,
}

impl Transition {
    fn to(next: CallStage, prompt: VoicePrompt) -> Self {
        Self { next, prompt }
    }
}

/// Computes the reply for one provider callback.
///
/// `digits` is whatever the provider echoed back; a missing value falls into
/// the same branch as an unrecognised one. Invalid input always restarts the
/// call at the entry stage instead of re-prompting.
pub fn advance(stage: CallStage, digits: Option<&str>) -> Transition {
    let digits = digits.unwrap_or_default();

    match stage {
        CallStage::Entry => Transition::to(CallStage::LanguageSelect, entry_prompt()),
        CallStage::LanguageSelect => language_select(digits),
        CallStage::MainMenu => main_menu(digits),
        CallStage::PnrPrompt => Transition::to(
            CallStage::RepeatMenu,
            // The entered PNR is echoed back with a canned status; the record
            // store is not consulted on this path.
            VoicePrompt::new()
                .say(format!(
                    "PNR number {digits}. Your ticket is confirmed. Coach S 3. Seat 45."
                ))
                .redirect(Route::RepeatMenu),
        ),
        CallStage::TrainStatusPrompt => Transition::to(
            CallStage::RepeatMenu,
            VoicePrompt::new()
                .say(format!(
                    "Train number {digits} is running on time. Expected arrival at 4 PM."
                ))
                .redirect(Route::RepeatMenu),
        ),
        CallStage::TrainSchedulePrompt => Transition::to(
            CallStage::RepeatMenu,
            VoicePrompt::new()
                .say(format!(
                    "Train number {digits} departs from Chennai at 10 AM and arrives in Bangalore at 4 PM."
                ))
                .redirect(Route::RepeatMenu),
        ),
        // Gather followed by hangup: the hangup only runs if the caller lets
        // the gather time out.
        CallStage::RepeatMenu => Transition::to(
            CallStage::MainMenu,
            VoicePrompt::new().gather(main_menu_gather()).hangup(),
        ),
        CallStage::Terminated => Transition::to(
            CallStage::Terminated,
            VoicePrompt::new().say(prompts::GOODBYE).hangup(),
        ),
    }
}

pub fn entry_prompt() -> VoicePrompt {
    VoicePrompt::new()
        .gather(GatherDirective::new(
            MENU_DIGITS,
            Route::Language,
            prompts::WELCOME,
        ))
        .say(prompts::NO_INPUT)
        .hangup()
}

fn main_menu_gather() -> GatherDirective {
    GatherDirective::new(MENU_DIGITS, Route::MainMenu, prompts::MAIN_MENU)
}

fn language_select(digits: &str) -> Transition {
    match Language::from_digit(digits) {
        Some(Language::English) => Transition::to(
            CallStage::MainMenu,
            VoicePrompt::new().gather(main_menu_gather()),
        ),
        Some(Language::Hindi) => Transition::to(
            CallStage::Terminated,
            VoicePrompt::new().say(prompts::HINDI_UNAVAILABLE).hangup(),
        ),
        None => Transition::to(
            CallStage::Entry,
            VoicePrompt::new()
                .say(prompts::INVALID_SELECTION)
                .redirect(Route::Voice),
        ),
    }
}

fn main_menu(digits: &str) -> Transition {
    let Some(option) = MenuOption::from_digit(digits) else {
        return Transition::to(
            CallStage::Entry,
            VoicePrompt::new()
                .say(prompts::INVALID_OPTION)
                .redirect(Route::Voice),
        );
    };

    match option {
        MenuOption::PnrStatus => Transition::to(
            CallStage::PnrPrompt,
            VoicePrompt::new().gather(GatherDirective::new(
                PNR_DIGITS,
                Route::Pnr,
                prompts::ENTER_PNR,
            )),
        ),
        MenuOption::TrainRunningStatus => Transition::to(
            CallStage::TrainStatusPrompt,
            VoicePrompt::new().gather(GatherDirective::new(
                TRAIN_NUMBER_DIGITS,
                Route::TrainStatus,
                prompts::ENTER_TRAIN,
            )),
        ),
        MenuOption::TrainSchedule => Transition::to(
            CallStage::TrainSchedulePrompt,
            VoicePrompt::new().gather(GatherDirective::new(
                TRAIN_NUMBER_DIGITS,
                Route::TrainSchedule,
                prompts::ENTER_TRAIN,
            )),
        ),
        MenuOption::BookingInfo => Transition::to(
            CallStage::RepeatMenu,
            VoicePrompt::new()
                .say(prompts::BOOKING_INFO)
                .redirect(Route::RepeatMenu),
        ),
        MenuOption::CancellationPolicy => Transition::to(
            CallStage::RepeatMenu,
            VoicePrompt::new()
                .say(prompts::CANCELLATION_POLICY)
                .redirect(Route::RepeatMenu),
        ),
        MenuOption::Restart => {
            Transition::to(CallStage::Entry, VoicePrompt::new().redirect(Route::Voice))
        }
        MenuOption::Exit => Transition::to(
            CallStage::Terminated,
            VoicePrompt::new().say(prompts::GOODBYE).hangup(),
        ),
    }
}

pub fn ticket_sentence(ticket: Option<&TicketRecord>) -> String {
    match ticket {
        Some(ticket) => format!(
            "Your ticket is {} in coach {} seat {}.",
            ticket.status, ticket.coach, ticket.seat
        ),
        None => prompts::PNR_NOT_FOUND.to_string(),
    }
}

pub fn train_timing_sentence(timing: Option<&TrainTiming>) -> String {
    match timing {
        Some(timing) => format!(
            "Train departs at {} and arrives at {}.",
            timing.departure, timing.arrival
        ),
        None => prompts::TRAIN_NOT_FOUND.to_string(),
    }
}

/// One-shot reply for the text simulation: speak and hang up.
pub fn spoken_reply(text: impl Into<String>) -> VoicePrompt {
    VoicePrompt::new().say(text).hangup()
}
