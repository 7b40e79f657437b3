//! Game session state machine.
//!
//! `Select → Ready → Playing → Summary`, with an answer/retry/advance
//! protocol nested under `Playing`. Every accepted event is persisted before
//! the call returns; rejected events leave the session untouched.

use super::phase::{DisplayState, GameEvent, Phase, Transition};
use super::view::{GameView, QuestionView, ResultView};
use crate::audio::{AudioCue, AudioPort, CueDispatcher};
use crate::bank::{Player, Question, QuestionBank, QuestionSet};
use crate::config::GameConfig;
use crate::error::{QuizError, Result};
use crate::save::{SessionSnapshot, SessionStore};
use crate::scoring::{AnswerResult, Ledger, ScoreSummary, ScoreTiers};

pub struct GameMachine<S: SessionStore, A: AudioPort> {
    bank: QuestionBank,
    store: S,
    cues: CueDispatcher<A>,
    tiers: ScoreTiers,
    currency: String,
    sound_enabled: bool,

    phase: Phase,
    player: Option<Player>,
    set: QuestionSet,
    current_index: usize,
    display: DisplayState,
    selected: Option<String>,
    ledger: Ledger,
}

impl<S: SessionStore, A: AudioPort> GameMachine<S, A> {
    /// Build a machine and resume whatever `store` holds.
    ///
    /// This is the only place `store.load()` is called, and no write can
    /// happen before it returns. Unreadable or inconsistent saves fall back
    /// to a fresh session at `Select`.
    pub fn boot(bank: QuestionBank, store: S, audio: A, config: &GameConfig) -> Self {
        let currency = config.currency_for(&bank).to_string();
        let mut machine = Self {
            bank,
            store,
            cues: CueDispatcher::new(audio),
            tiers: config.score_tiers.clone(),
            currency,
            sound_enabled: config.sound_enabled,
            phase: Phase::Select,
            player: None,
            set: QuestionSet::default(),
            current_index: 0,
            display: DisplayState::AwaitingAnswer,
            selected: None,
            ledger: Ledger::new(),
        };

        if !machine.sound_enabled {
            machine.cues.emit(AudioCue::MuteAll);
        }

        let loaded = match machine.store.load() {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_corruption() => {
                log::warn!("Saved session is unreadable, starting fresh: {}", e);
                None
            }
            Err(e) => {
                log::warn!("Could not read saved session, starting fresh: {}", e);
                None
            }
        };

        if let Some(snapshot) = loaded {
            match machine.restore(snapshot) {
                Ok(()) => log::info!(
                    "Resumed session: phase {:?}, question {} of {}",
                    machine.phase,
                    machine.current_index + 1,
                    machine.set.len()
                ),
                Err(reason) => {
                    log::warn!("Saved session does not match question data, starting fresh: {}", reason);
                    machine.clear_session();
                }
            }
        }

        match machine.phase {
            Phase::Select => machine.cues.emit(AudioCue::BeforeSelection),
            Phase::Playing if machine.display == DisplayState::AwaitingAnswer => {
                machine.cues.start_suspense()
            }
            _ => {}
        }

        machine
    }

    fn restore(&mut self, snapshot: SessionSnapshot) -> std::result::Result<(), String> {
        let SessionSnapshot { phase, player, current_index, results } = snapshot;
        if phase == Phase::Select {
            return Ok(());
        }

        let stored = player.ok_or_else(|| format!("phase {:?} without a player", phase))?;
        let player = self
            .bank
            .player(&stored.id)
            .cloned()
            .ok_or_else(|| format!("player {} is not in the catalog", stored.id))?;
        if player != stored {
            log::debug!("Saved player {} differs from the catalog entry, using the catalog", player.id);
        }

        let set = self.bank.questions_for(&player.id);
        let ledger = Ledger::from_results(results)
            .map_err(|id| format!("question {} answered twice", id))?;

        let mut answered = Vec::with_capacity(ledger.len());
        for result in ledger.ordered(&set) {
            let position = set
                .position_of(&result.question_id)
                .ok_or_else(|| format!("question {} is not in the set", result.question_id))?;
            answered.push(position);
        }

        match phase {
            Phase::Select => {}
            Phase::Ready => {
                if current_index != 0 || !ledger.is_empty() {
                    return Err("ready session already has progress".to_string());
                }
            }
            Phase::Playing => {
                if current_index >= set.len() {
                    return Err(format!("index {} past the last question", current_index));
                }
                // Everything before the pointer is answered, nothing after it.
                let expected_before: Vec<usize> = (0..current_index).collect();
                let before: Vec<usize> =
                    answered.iter().copied().filter(|p| *p < current_index).collect();
                if before != expected_before || answered.iter().any(|p| *p > current_index) {
                    return Err("results do not match the question pointer".to_string());
                }
            }
            Phase::Summary => {
                if current_index > set.len() || ledger.len() != set.len() {
                    return Err("summary without a full set of answers".to_string());
                }
            }
        }

        let (display, selected) = match (phase, set.get(current_index)) {
            (Phase::Playing, Some(q)) => match ledger.get(&q.id) {
                Some(r) => (DisplayState::ShowingResult, Some(r.selected_answer.clone())),
                None => (DisplayState::AwaitingAnswer, None),
            },
            _ => (DisplayState::AwaitingAnswer, None),
        };

        self.phase = phase;
        self.player = Some(player);
        self.current_index = match phase {
            Phase::Summary => set.len(),
            _ => current_index,
        };
        self.set = set;
        self.display = display;
        self.selected = selected;
        self.ledger = ledger;
        Ok(())
    }

    // ========================
    // Events
    // ========================

    pub fn dispatch(&mut self, event: &GameEvent) -> Result<Transition> {
        match event {
            GameEvent::SelectPlayer { player_id } => self.select_player(player_id),
            GameEvent::ConfirmStart => self.confirm_start(),
            GameEvent::ChooseAnswer { key } => self.choose_answer(key),
            GameEvent::RetryCurrent => self.retry_current(),
            GameEvent::Advance => self.advance(),
            GameEvent::Restart => self.restart(),
            GameEvent::ResetAll => self.reset_all(),
            GameEvent::ToggleSound => Ok(self.toggle_sound()),
        }
    }

    /// Select → Ready with a fresh ledger.
    pub fn select_player(&mut self, player_id: &str) -> Result<Transition> {
        const EVENT: &str = "select_player";
        self.require_phase(Phase::Select, EVENT)?;
        let player = self
            .bank
            .player(player_id)
            .cloned()
            .ok_or_else(|| QuizError::UnknownPlayer(player_id.to_string()))?;

        self.set = self.bank.questions_for(&player.id);
        log::info!("Player {} selected ({} questions)", player.name, self.set.len());
        self.player = Some(player);
        self.ledger.clear();
        self.current_index = 0;
        self.clear_selection();
        self.phase = Phase::Ready;

        Ok(self.commit(Phase::Select, EVENT))
    }

    /// Ready → Playing; straight to Summary when the set is empty.
    pub fn confirm_start(&mut self) -> Result<Transition> {
        const EVENT: &str = "confirm_start";
        self.require_phase(Phase::Ready, EVENT)?;

        self.cues.emit(AudioCue::GameStart);
        self.current_index = 0;
        self.clear_selection();
        if self.set.is_empty() {
            self.enter_summary();
        } else {
            self.phase = Phase::Playing;
            self.cues.start_suspense();
        }

        Ok(self.commit(Phase::Ready, EVENT))
    }

    /// Record an answer for the current question. A second answer while the
    /// result is showing is ignored.
    pub fn choose_answer(&mut self, key: &str) -> Result<Transition> {
        const EVENT: &str = "choose_answer";
        self.require_phase(Phase::Playing, EVENT)?;
        if self.display == DisplayState::ShowingResult {
            return Ok(Transition::unchanged(self.phase));
        }

        let ordinal = self.current_index;
        let question = self.current_question().ok_or_else(|| self.reject(EVENT))?;
        if !question.has_option(key) {
            return Err(QuizError::UnknownOption { question: question.id.clone(), key: key.to_string() });
        }
        let is_correct = question.is_correct(key);
        let question_id = question.id.clone();
        let question_value = self.active_player(EVENT)?.question_value(ordinal);

        self.ledger.upsert(AnswerResult {
            question_id,
            question_value,
            selected_answer: key.to_string(),
            is_correct,
        });
        self.display = DisplayState::ShowingResult;
        self.selected = Some(key.to_string());
        self.cues.stop_suspense();
        self.cues.emit(AudioCue::Answered { correct: is_correct });

        Ok(self.commit(Phase::Playing, EVENT))
    }

    /// Drop the current question's answer and ask it again.
    pub fn retry_current(&mut self) -> Result<Transition> {
        const EVENT: &str = "retry_current";
        self.require_showing_result(EVENT)?;

        if let Some(id) = self.current_question().map(|q| q.id.clone()) {
            self.ledger.remove(&id);
        }
        self.clear_selection();
        self.cues.start_suspense();

        Ok(self.commit(Phase::Playing, EVENT))
    }

    /// Next question, or Summary after the last one.
    pub fn advance(&mut self) -> Result<Transition> {
        const EVENT: &str = "advance";
        self.require_showing_result(EVENT)?;

        if self.current_index + 1 >= self.set.len() {
            self.enter_summary();
        } else {
            self.current_index += 1;
            self.clear_selection();
            self.cues.start_suspense();
        }

        Ok(self.commit(Phase::Playing, EVENT))
    }

    /// Summary → Select, forgetting the session.
    pub fn restart(&mut self) -> Result<Transition> {
        self.require_phase(Phase::Summary, "restart")?;
        self.return_to_select();
        log::debug!("restart: {:?} -> {:?}", Phase::Summary, Phase::Select);
        Ok(Transition::new(Phase::Summary, Phase::Select))
    }

    /// Back to Select from anywhere, erasing the saved session.
    pub fn reset_all(&mut self) -> Result<Transition> {
        let from = self.phase;
        self.return_to_select();
        log::debug!("reset_all: {:?} -> {:?}", from, Phase::Select);
        Ok(Transition::new(from, Phase::Select))
    }

    pub fn toggle_sound(&mut self) -> Transition {
        self.sound_enabled = !self.sound_enabled;
        let cue = if self.sound_enabled { AudioCue::UnmuteAll } else { AudioCue::MuteAll };
        self.cues.emit(cue);
        Transition::new(self.phase, self.phase)
    }

    // ========================
    // Accessors
    // ========================

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn question_set(&self) -> &QuestionSet {
        &self.set
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn display(&self) -> DisplayState {
        self.display
    }

    pub fn selected_answer(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::Playing => self.set.get(self.current_index),
            _ => None,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Ledger entries in question order.
    pub fn results(&self) -> Vec<AnswerResult> {
        self.ledger.ordered(&self.set)
    }

    /// Running score while playing, final score on the summary.
    pub fn score(&self) -> Option<ScoreSummary> {
        let player = self.player.as_ref()?;
        match self.phase {
            Phase::Playing => Some(ScoreSummary::compute(&self.set, player, &self.results())),
            Phase::Summary => Some(
                ScoreSummary::compute(&self.set, player, &self.results()).with_message(&self.tiers),
            ),
            _ => None,
        }
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn suspense_playing(&self) -> bool {
        self.cues.suspense_playing()
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn audio(&self) -> &A {
        self.cues.port()
    }

    pub fn audio_mut(&mut self) -> &mut A {
        self.cues.port_mut()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            player: self.player.clone(),
            current_index: self.current_index,
            results: self.results(),
        }
    }

    pub fn view(&self) -> GameView {
        let question = self.current_question().map(|q| QuestionView {
            ordinal: self.current_index,
            total: self.set.len(),
            value: self
                .player
                .as_ref()
                .map(|p| p.question_value(self.current_index))
                .unwrap_or_default(),
            question: q.clone(),
            display: self.display,
            selected_answer: self.selected.clone(),
            is_correct: match self.display {
                DisplayState::ShowingResult => self.selected.as_deref().map(|k| q.is_correct(k)),
                DisplayState::AwaitingAnswer => None,
            },
        });

        GameView {
            phase: self.phase,
            players: self.bank.players().to_vec(),
            player: self.player.clone(),
            question,
            results: self.results(),
            review: match self.phase {
                Phase::Summary => self.review(),
                _ => Vec::new(),
            },
            score: self.score(),
            sound_enabled: self.sound_enabled,
            currency: self.currency.clone(),
        }
    }

    /// Answered questions in set order, with their text and correct answer.
    pub fn review(&self) -> Vec<ResultView> {
        self.results()
            .into_iter()
            .filter_map(|result| {
                let ordinal = self.set.position_of(&result.question_id)?;
                let question = self.set.get(ordinal)?;
                Some(ResultView {
                    ordinal,
                    question: question.text.clone(),
                    image_ref: question.image_ref.clone(),
                    selected_answer: result.selected_answer,
                    correct_answer: question.correct_answer.clone(),
                    correct_text: question.correct_text().map(str::to_string),
                    is_correct: result.is_correct,
                    value: result.question_value,
                })
            })
            .collect()
    }

    /// Stop any running cue, release the audio port and hand back the parts.
    pub fn into_parts(self) -> (S, A) {
        (self.store, self.cues.shutdown())
    }

    // ========================
    // Internals
    // ========================

    fn reject(&self, event: &'static str) -> QuizError {
        QuizError::InvalidTransition { phase: self.phase, event }
    }

    fn require_phase(&self, phase: Phase, event: &'static str) -> Result<()> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(self.reject(event))
        }
    }

    fn require_showing_result(&self, event: &'static str) -> Result<()> {
        self.require_phase(Phase::Playing, event)?;
        if self.display == DisplayState::ShowingResult {
            Ok(())
        } else {
            Err(self.reject(event))
        }
    }

    fn active_player(&self, event: &'static str) -> Result<&Player> {
        self.player.as_ref().ok_or_else(|| self.reject(event))
    }

    fn clear_selection(&mut self) {
        self.display = DisplayState::AwaitingAnswer;
        self.selected = None;
    }

    fn enter_summary(&mut self) {
        self.phase = Phase::Summary;
        self.current_index = self.set.len();
        self.clear_selection();
        self.cues.stop_suspense();
        self.cues.emit(AudioCue::Victory);

        if let Some(score) = self.score() {
            log::info!(
                "Session complete: {}/{} correct, won {} of {}",
                score.correct_count,
                score.total_answered,
                score.amount_won.display_with(&self.currency),
                score.max_possible.display_with(&self.currency)
            );
        }
    }

    fn clear_session(&mut self) {
        self.phase = Phase::Select;
        self.player = None;
        self.set = QuestionSet::default();
        self.current_index = 0;
        self.clear_selection();
        self.ledger.clear();
    }

    fn return_to_select(&mut self) {
        self.cues.stop_suspense();
        self.clear_session();
        if let Err(e) = self.store.clear() {
            log::warn!("Failed to erase saved session: {}", e);
        }
        self.cues.emit(AudioCue::BeforeSelection);
    }

    /// Persist the new state and report the transition.
    fn commit(&mut self, from: Phase, event: &str) -> Transition {
        let snapshot = self.snapshot();
        if let Err(e) = self.store.save(&snapshot) {
            log::warn!("Failed to persist session after {}: {}", event, e);
        }
        log::debug!("{}: {:?} -> {:?} (question {})", event, from, self.phase, self.current_index);
        Transition::new(from, self.phase)
    }
}
