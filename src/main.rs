//! Suika Planet entry point
//!
//! In the browser: DOM rendering, input listeners and the animation-frame
//! loop. Natively: a headless runner that drops fruit at random until the
//! session ends, for soak testing the physics.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlElement, KeyboardEvent, PointerEvent, TouchEvent};

    use suika_planet::audio::{AudioManager, SoundEffect};
    use suika_planet::consts::*;
    use suika_planet::highscores::{ScoreBoard, format_date};
    use suika_planet::input::{InputEvent, InputSubscription};
    use suika_planet::presentation::{FrameView, Presenter, Visual};
    use suika_planet::settings::Settings;
    use suika_planet::sim::{Dismissal, ObjectId, Rank, RapierWorld};
    use suika_planet::{Game, GameConfig};

    type WebGame = Game<RapierWorld, DomPresenter>;

    /// Field size in CSS pixels before scaling
    const FIELD_PX: f32 = PLAY_FIELD_RADIUS * 2.0 * M_TO_DISPLAY;
    const SVG_NS: &str = "http://www.w3.org/2000/svg";

    fn document() -> Result<Document, JsValue> {
        web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))
    }

    fn element(document: &Document, id: &str) -> Result<HtmlElement, JsValue> {
        document
            .get_element_by_id(id)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{}", id)))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| JsValue::from_str(&format!("#{} is not an HTML element", id)))
    }

    fn set_hidden(el: &Element, hidden: bool) {
        let _ = el.class_list().toggle_with_force("hidden", hidden);
    }

    /// Draws objects as absolutely positioned divs inside `#field`
    struct DomPresenter {
        document: Document,
        field: HtmlElement,
        score: HtmlElement,
        nodes: HashMap<ObjectId, HtmlElement>,
        held: Vec<HtmlElement>,
        previews: Vec<HtmlElement>,
        /// Drawn once per session; the layout never changes
        dividers: Option<Element>,
        audio: AudioManager,
    }

    impl DomPresenter {
        fn new(document: Document) -> Result<Self, JsValue> {
            let field = element(&document, "field")?;
            let score = element(&document, "score")?;
            Ok(Self {
                document,
                field,
                score,
                nodes: HashMap::new(),
                held: Vec::new(),
                previews: Vec::new(),
                dividers: None,
                audio: AudioManager::new(Settings::load()),
            })
        }

        /// Clear the field for a new session
        fn reset(&mut self) {
            self.field.set_inner_html("");
            self.nodes.clear();
            self.held.clear();
            self.previews.clear();
            self.dividers = None;
            self.score.set_text_content(Some("0"));
            let _ = self.field.class_list().remove_1("danger");
        }

        /// Browsers only start audio from inside a user gesture
        fn resume_audio(&self) {
            self.audio.resume();
        }

        fn toggle_mute(&mut self) {
            let mut settings = self.audio.settings().clone();
            let muted = settings.toggle_mute();
            if let Err(e) = settings.save() {
                log::warn!("Failed to save settings: {}", e);
            }
            self.audio.set_settings(settings);
            log::info!("Sound {}", if muted { "muted" } else { "on" });
        }

        /// One SVG wedge per divider, in the field's own coordinates
        fn create_dividers(&self, angles: &[f32], half_arc: f32) -> Result<Element, JsValue> {
            let svg = self.document.create_element_ns(Some(SVG_NS), "svg")?;
            svg.set_attribute("viewBox", "0 0 100 100")?;
            svg.set_attribute("class", "dividers")?;
            let edge = |a: f32| (50.0 + 50.0 * a.cos(), 50.0 + 50.0 * a.sin());
            for &angle in angles {
                let (x0, y0) = edge(angle - half_arc);
                let (x1, y1) = edge(angle + half_arc);
                let path = self.document.create_element_ns(Some(SVG_NS), "path")?;
                path.set_attribute(
                    "d",
                    &format!("M 50 50 L {} {} A 50 50 0 0 1 {} {} Z", x0, y0, x1, y1),
                )?;
                svg.append_child(&path)?;
            }
            self.field.append_child(&svg)?;
            Ok(svg)
        }

        fn create_node(&self, class: &str) -> Result<HtmlElement, JsValue> {
            let node = self
                .document
                .create_element("div")?
                .dyn_into::<HtmlElement>()
                .map_err(|_| JsValue::from_str("div is not an HTML element"))?;
            node.set_class_name(class);
            self.field.append_child(&node)?;
            Ok(node)
        }

        fn place(node: &HtmlElement, x: f32, y: f32, radius: f32, rotation: f32) {
            let size = radius * 2.0 * M_TO_DISPLAY;
            let left = FIELD_PX / 2.0 + x * M_TO_DISPLAY - size / 2.0;
            let top = FIELD_PX / 2.0 + y * M_TO_DISPLAY - size / 2.0;
            let style = node.style();
            let _ = style.set_property("width", &format!("{}px", size));
            let _ = style.set_property("height", &format!("{}px", size));
            let _ = style.set_property(
                "transform",
                &format!("translate({}px, {}px) rotate({}rad)", left, top, rotation),
            );
        }

        fn class_for(visual: Visual) -> String {
            match visual {
                Visual::Planet => "planet".to_string(),
                Visual::Fruit { rank } => format!("fruit rank-{}", rank),
            }
        }

        fn draw(&mut self, frame: &FrameView) -> Result<(), JsValue> {
            if self.dividers.is_none() {
                self.dividers = Some(self.create_dividers(&frame.dividers, frame.divider_half_arc)?);
            }

            for object in &frame.objects {
                if !self.nodes.contains_key(&object.id) {
                    let node = self.create_node(&Self::class_for(object.visual))?;
                    self.nodes.insert(object.id, node);
                }
                if let Some(node) = self.nodes.get(&object.id) {
                    Self::place(
                        node,
                        object.position.x,
                        object.position.y,
                        object.radius,
                        object.rotation,
                    );
                }
            }
            self.nodes.retain(|id, node| {
                let live = frame.objects.iter().any(|o| o.id == *id);
                if !live {
                    node.remove();
                }
                live
            });

            while self.held.len() < frame.slots.len() {
                let node = self.create_node("held")?;
                self.held.push(node);
            }
            for (slot, node) in frame.slots.iter().zip(&self.held) {
                match slot.held {
                    Some(held) => {
                        node.set_class_name(&format!("held fruit rank-{}", held.rank));
                        Self::place(node, held.position.x, held.position.y, held.radius, 0.0);
                    }
                    None => set_hidden(node, true),
                }
            }

            while self.previews.len() < frame.slots.len() {
                let node = self.create_node("preview")?;
                self.previews.push(node);
            }
            for (slot, node) in frame.slots.iter().zip(&self.previews) {
                match slot.next {
                    Some(next) => {
                        node.set_class_name(&format!("preview fruit rank-{}", next.rank));
                        Self::place(node, next.position.x, next.position.y, next.radius, 0.0);
                    }
                    None => set_hidden(node, true),
                }
            }
            Ok(())
        }
    }

    impl Presenter for DomPresenter {
        fn render(&mut self, frame: &FrameView) {
            if let Err(e) = self.draw(frame) {
                log::error!("Render failed: {:?}", e);
            }
        }

        fn dropped(&mut self, _rank: Rank) {
            self.audio.play(SoundEffect::Drop);
        }

        fn score_changed(&mut self, score: u64) {
            self.score.set_text_content(Some(&score.to_string()));
        }

        fn pop(&mut self, _rank: Rank, fraction: f32) {
            self.audio.play(SoundEffect::Pop { fraction });
        }

        fn danger_changed(&mut self, danger: bool) {
            let _ = self.field.class_list().toggle_with_force("danger", danger);
            self.audio.set_danger(danger);
        }

        fn game_over(&mut self, score: u64) {
            self.audio.play(SoundEffect::GameOver);
            if let Ok(el) = element(&self.document, "game-over") {
                set_hidden(&el, false);
            }
            if let Ok(el) = element(&self.document, "final-score") {
                el.set_text_content(Some(&score.to_string()));
            }
        }

        fn session_ended(&mut self, _score: u64, how: Dismissal) {
            log::info!("Game over screen dismissed ({:?})", how);
            if let Ok(el) = element(&self.document, "game-over") {
                set_hidden(&el, true);
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&JsValue::from_str(&e.to_string()));
        }

        log::info!("Suika Planet starting...");

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = document()?;

        let search = window.location().search().unwrap_or_default();
        if let Ok(loading) = element(&document, "loading") {
            set_hidden(&loading, true);
        }

        match GameConfig::query_players(&search) {
            Ok(Some(_)) => {
                let config = GameConfig::from_query(&search).unwrap_or_else(|e| {
                    log::warn!("Ignoring query parameters: {}", e);
                    GameConfig::default()
                });
                start(config, &document)
            }
            Ok(None) => show_player_select(&document),
            Err(e) => {
                log::warn!("Ignoring query parameters: {}", e);
                show_player_select(&document)
            }
        }
    }

    /// Buttons 1..=MAX_PLAYERS; the first press starts the game
    fn show_player_select(document: &Document) -> Result<(), JsValue> {
        let overlay = element(document, "select-players")?;
        let buttons = element(document, "player-buttons")?;
        let started = Rc::new(Cell::new(false));

        for players in 1..=MAX_PLAYERS {
            let button = document.create_element("button")?;
            button.set_text_content(Some(&players.to_string()));

            let started = started.clone();
            let overlay = overlay.clone();
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                if started.replace(true) {
                    return;
                }
                set_hidden(&overlay, true);
                if let Err(e) = start(GameConfig::with_players(players), &document) {
                    log::error!("Failed to start: {:?}", e);
                }
            });
            button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
            buttons.append_child(&button)?;
        }

        set_hidden(&overlay, false);
        Ok(())
    }

    fn start(config: GameConfig, document: &Document) -> Result<(), JsValue> {
        let presenter = DomPresenter::new(document.clone())?;
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(
            config,
            seed,
            RapierWorld::new(),
            presenter,
            ScoreBoard::load(),
        )));

        let subscription = attach_input(&game, document)?;
        game.borrow_mut().attach_input(subscription);
        setup_dismiss(&game, document);
        setup_play_again(&game, document);

        request_animation_frame(game);
        log::info!("Suika Planet running!");
        Ok(())
    }

    /// Client coordinates to field meters, relative to the center
    fn to_field(field: &HtmlElement, client_x: i32, client_y: i32) -> (f32, f32) {
        let rect = field.get_bounding_client_rect();
        let cx = rect.left() + rect.width() / 2.0;
        let cy = rect.top() + rect.height() / 2.0;
        let scale = (PLAY_FIELD_RADIUS * 2.0) as f64 / rect.width().max(1.0);
        (
            ((client_x as f64 - cx) * scale) as f32,
            ((client_y as f64 - cy) * scale) as f32,
        )
    }

    /// Register pointer, touch and keyboard listeners
    ///
    /// The returned subscription removes every listener when released.
    fn attach_input(
        game: &Rc<RefCell<WebGame>>,
        document: &Document,
    ) -> Result<InputSubscription, JsValue> {
        let field = element(document, "field")?;
        let mut registered: Vec<(&'static str, Closure<dyn FnMut(web_sys::Event)>)> = Vec::new();

        let pointer = |kind: &'static str| {
            let game = game.clone();
            let field = field.clone();
            Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
                let Ok(event) = event.dyn_into::<PointerEvent>() else {
                    return;
                };
                // Touches are routed through the touch listeners
                if event.pointer_type() != "mouse" {
                    return;
                }
                let (x, y) = to_field(&field, event.client_x(), event.client_y());
                let mut game = game.borrow_mut();
                let input = if kind == "pointerdown" {
                    game.presenter().resume_audio();
                    InputEvent::PointerDown { x, y }
                } else {
                    InputEvent::PointerMove { x, y }
                };
                game.handle_input(input);
            })
        };
        registered.push(("pointermove", pointer("pointermove")));
        registered.push(("pointerdown", pointer("pointerdown")));

        let touch = |kind: &'static str| {
            let game = game.clone();
            let field = field.clone();
            Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
                let Ok(event) = event.dyn_into::<TouchEvent>() else {
                    return;
                };
                event.prevent_default();
                let touches = event.changed_touches();
                let mut game = game.borrow_mut();
                if kind == "touchstart" {
                    game.presenter().resume_audio();
                }
                for i in 0..touches.length() {
                    let Some(touch) = touches.get(i) else {
                        continue;
                    };
                    let (x, y) = to_field(&field, touch.client_x(), touch.client_y());
                    let id = touch.identifier();
                    let input = match kind {
                        "touchstart" => InputEvent::TouchStart { id, x, y },
                        "touchmove" => InputEvent::TouchMove { id, x, y },
                        "touchcancel" => InputEvent::TouchCancel { id },
                        _ => InputEvent::TouchEnd { id, x, y },
                    };
                    game.handle_input(input);
                }
            })
        };
        registered.push(("touchstart", touch("touchstart")));
        registered.push(("touchmove", touch("touchmove")));
        registered.push(("touchend", touch("touchend")));
        registered.push(("touchcancel", touch("touchcancel")));

        {
            let game = game.clone();
            let keydown = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
                let Ok(event) = event.dyn_into::<KeyboardEvent>() else {
                    return;
                };
                if event.repeat() {
                    return;
                }
                let mut game = game.borrow_mut();
                game.presenter().resume_audio();
                match event.key().as_str() {
                    " " => {
                        event.prevent_default();
                        game.handle_input(InputEvent::DropAll);
                    }
                    "m" | "M" => game.presenter_mut().toggle_mute(),
                    _ => {}
                }
            });
            registered.push(("keydown", keydown));
        }

        for (name, closure) in &registered {
            document.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        }

        let document = document.clone();
        Ok(InputSubscription::new(move || {
            for (name, closure) in &registered {
                let _ = document
                    .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            }
            log::info!("Input listeners detached");
        }))
    }

    /// Any click or tap can dismiss the game-over screen
    fn setup_dismiss(game: &Rc<RefCell<WebGame>>, document: &Document) {
        for name in ["click", "touchend"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow().click();
            });
            let _ = document.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_play_again(game: &Rc<RefCell<WebGame>>, document: &Document) {
        let Ok(button) = element(document, "play-again") else {
            return;
        };
        let game = game.clone();
        let document = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            if game.borrow().ended().is_none() {
                return;
            }
            {
                let mut g = game.borrow_mut();
                g.presenter_mut().reset();
                g.restart(js_sys::Date::now() as u64, RapierWorld::new());
            }
            match attach_input(&game, &document) {
                Ok(subscription) => game.borrow_mut().attach_input(subscription),
                Err(e) => log::error!("Failed to attach input: {:?}", e),
            }
            if let Ok(el) = element(&document, "scores") {
                set_hidden(&el, true);
            }
            log::info!("New session started");
        });
        let _ = button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn show_score_table(document: &Document, scores: &ScoreBoard, session_id: &str) {
        let Ok(table) = element(document, "score-rows") else {
            return;
        };
        let rows: String = scores
            .records
            .iter()
            .map(|r| {
                let class = if r.session_id == session_id { " class=\"current\"" } else { "" };
                format!(
                    "<tr{}><td>{}</td><td>{}</td><td>{}</td></tr>",
                    class,
                    r.score,
                    format_date(r.timestamp),
                    r.num_players
                )
            })
            .collect();
        table.set_inner_html(&rows);
        if let Ok(el) = element(document, "scores") {
            set_hidden(&el, false);
        }
    }

    fn request_animation_frame(game: Rc<RefCell<WebGame>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<WebGame>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            let was_ended = g.ended().is_some();
            g.frame(time);
            if !was_ended && g.ended().is_some() {
                if let Ok(document) = document() {
                    show_score_table(&document, g.scores(), &g.state().session_id);
                }
            }
        }

        // Re-armed unconditionally; a finished session just renders
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = web::run() {
        web_sys::console::error_1(&e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use suika_planet::consts::TIME_STEP;
    use suika_planet::highscores::ScoreBoard;
    use suika_planet::input::InputEvent;
    use suika_planet::presentation::LogPresenter;
    use suika_planet::sim::RapierWorld;
    use suika_planet::{Game, GameConfig, polar_to_cartesian};

    /// Frames between automatic drops
    const DROP_EVERY: u64 = 40;
    /// Give up after ten simulated minutes
    const MAX_FRAMES: u64 = 60 * 60 * 10;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let query = args.next().map(|p| format!("players={}", p)).unwrap_or_default();
    let config = match GameConfig::from_query(&query) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);

    log::info!("Suika Planet (headless) starting, seed {}", seed);

    let mut game = Game::new(
        config,
        seed,
        RapierWorld::new(),
        LogPresenter::default(),
        ScoreBoard::load(),
    );
    let mut rng = Pcg32::seed_from_u64(seed ^ 0x5eed);
    let step_ms = TIME_STEP as f64 * 1000.0;

    for frame in 0..MAX_FRAMES {
        let now = frame as f64 * step_ms;
        if game.state().is_over() {
            game.click();
        } else if frame % DROP_EVERY == 0 {
            let state = game.state();
            let slot = rng.random_range(0..state.slots.len());
            let wedge = state.layout.wedge(slot);
            let angle = wedge.middle_angle + wedge.half_width * rng.random_range(-0.8..0.8);
            let aim = polar_to_cartesian(state.layout.hold_radius(), angle);
            game.handle_input(InputEvent::PointerDown { x: aim.x, y: aim.y });
        }

        game.frame(now);
        if game.ended().is_some() {
            break;
        }
    }

    let state = game.state();
    log::info!(
        "Final score {} after {} ticks ({} drops, {} fruit on the field, {} frames rendered)",
        state.score,
        state.time_ticks,
        game.presenter().drops,
        state.fruit_count(),
        game.presenter().frames
    );
}
