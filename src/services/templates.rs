//! services/templates.rs
//! Escenas Manim predefinidas: respaldo cuando falla el render, escenas de error,
//! animaciones de texto/conceptos/segmento y plantillas de física cuántica.

use crate::models::segment_model::Segment;
use crate::services::code_sanitizer::sanitize_scene_name;
use crate::utils::{ascii_only, py_list, py_str, truncate_chars, truncate_with_suffix};

const QUANTUM_KEYWORDS: &[&str] = &[
    "quantum",
    "entangle",
    "superposition",
    "qubit",
    "wave function",
    "collapse",
    "measurement",
    "decoherence",
    "tunneling",
    "interference",
    "teleportation",
    "spin",
    "coherence",
    "bloch",
    "schrodinger",
    "heisenberg",
    "uncertainty",
    "observable",
    "eigenstate",
    "hilbert",
    "hermitian",
    "unitary",
    "density matrix",
    "mixed state",
    "pure state",
    "fidelity",
    "tomography",
    "error correction",
    "non-local",
    "spooky action",
    "hidden variable",
];

/// Claves cortas que sólo cuentan como palabra completa ("epr" aparece dentro de "represent").
const QUANTUM_WORDS: &[&str] = &["bell", "epr", "chsh"];

fn has_word(text: &str, words: &[&str]) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| words.contains(&token))
}

/// Escena mínima y confiable para cuando manim falla con el código generado.
/// Devuelve `(código, nombre_de_escena)`.
pub fn fallback_scene(scene_name: &str) -> (String, String) {
    let safe_name = sanitize_scene_name(scene_name);

    let topic = ascii_only(&scene_name.replace('_', " ").replace("Scene", ""));
    let topic = topic.trim();
    let topic = if topic.is_empty() {
        "Research Animation".to_string()
    } else if topic.chars().count() > 35 {
        format!("{}...", truncate_chars(topic, 32))
    } else {
        topic.to_string()
    };

    let code = format!(
        r#"from manim import *
import numpy as np

class {name}(Scene):
    def construct(self):
        title = Text({title}, font_size=32, color=BLUE)
        title.to_edge(UP, buff=0.8)
        self.play(Write(title), run_time=1)

        circle = Circle(radius=1.5, color=BLUE, stroke_width=3)
        circle.set_fill(BLUE, opacity=0.2)
        self.play(GrowFromCenter(circle), run_time=1)

        dots = VGroup()
        for i in range(6):
            angle = i * PI / 3
            dot = Dot(color=YELLOW, radius=0.1)
            dot.move_to(1.5 * np.array([np.cos(angle), np.sin(angle), 0]))
            dots.add(dot)

        self.play(*[GrowFromCenter(d) for d in dots], run_time=0.8)
        self.play(Rotate(dots, angle=PI, about_point=ORIGIN), run_time=2)
        self.play(circle.animate.scale(1.1), run_time=0.3)
        self.play(circle.animate.scale(1 / 1.1), run_time=0.3)
        self.wait(0.5)

        self.play(FadeOut(title), FadeOut(circle), FadeOut(dots), run_time=0.8)

        brand = Text("Animation by Xe-Bot", font_size=28, color=BLUE)
        self.play(Write(brand), run_time=0.5)
        self.wait(1)
        self.play(FadeOut(brand), run_time=0.5)
"#,
        name = safe_name,
        title = py_str(&topic),
    );

    (code, safe_name)
}

/// Escena que se usa cuando el código generado no es Python válido.
pub fn error_scene() -> String {
    r#"from manim import *

class GeneratedScene(Scene):
    def construct(self):
        title = Text("Animation Generation Error", font_size=36, color=RED)
        subtitle = Text("Using fallback animation", font_size=24)
        subtitle.next_to(title, DOWN)
        self.play(Write(title), FadeIn(subtitle))
        self.wait(2)
        self.play(FadeOut(title), FadeOut(subtitle))

        branding = Text("Animation by Xe-Bot", font_size=36, color=BLUE)
        self.play(FadeIn(branding))
        self.wait(2)
        self.play(FadeOut(branding))
"#
    .to_string()
}

/// Escena genérica para cuando el LLM no devolvió ninguna clase Scene.
pub fn generic_scene() -> String {
    r#"from manim import *

class GeneratedScene(Scene):
    def construct(self):
        title = Text("Research Animation", font_size=48)
        self.play(Write(title))
        self.wait(2)
        self.play(FadeOut(title))

        branding = Text("Animation by Xe-Bot", font_size=36, color=BLUE)
        self.play(FadeIn(branding))
        self.wait(2)
        self.play(FadeOut(branding))
"#
    .to_string()
}

/// Parte el texto en renglones de ~50 caracteres.
pub fn chunk_text(text: &str, width: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut length = 0;

    for word in text.split_whitespace() {
        let len = word.chars().count();
        if !current.is_empty() && length + len > width {
            chunks.push(current.join(" "));
            current = vec![word];
            length = len + 1;
        } else {
            current.push(word);
            length += len + 1;
        }
    }
    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}

/// Animación simple de texto (título + renglones que se van reemplazando).
pub fn text_animation(text: &str, title: &str) -> String {
    let chunks = chunk_text(text, 50);
    format!(
        r#"from manim import *

class ResearchAnimation(Scene):
    def construct(self):
        title = Text({title}, font_size=42, color=BLUE)
        title.to_edge(UP)
        self.play(Write(title))
        self.wait(0.5)

        chunks = {chunks}

        previous_text = None
        for chunk in chunks:
            text = Text(chunk, font_size=28)
            text.next_to(title, DOWN, buff=1.5)
            if previous_text:
                self.play(FadeOut(previous_text), FadeIn(text))
            else:
                self.play(Write(text))
            self.wait(2)
            previous_text = text

        if previous_text:
            self.play(FadeOut(title), FadeOut(previous_text))
        else:
            self.play(FadeOut(title))
        self.wait(0.5)
"#,
        title = py_str(title),
        chunks = py_list(&chunks),
    )
}

/// Lista de conceptos clave con colores rotativos.
pub fn concept_animation(concepts: &[String], title: &str) -> String {
    let concepts: Vec<String> = concepts
        .iter()
        .take(8)
        .map(|c| truncate_with_suffix(c, 40, "..."))
        .collect();
    format!(
        r#"from manim import *

class ConceptAnimation(Scene):
    def construct(self):
        title = Text({title}, font_size=48, color=BLUE)
        self.play(Write(title))
        self.wait(1)
        self.play(title.animate.to_edge(UP))

        concepts = {concepts}
        colors = [RED, GREEN, YELLOW, PURPLE, ORANGE, TEAL]
        concept_mobjects = [
            Text(c, font_size=32, color=colors[i % len(colors)]) for i, c in enumerate(concepts)
        ]

        if concept_mobjects:
            group = VGroup(*concept_mobjects)
            group.arrange(DOWN, buff=0.5)
            group.next_to(title, DOWN, buff=1)
            for mob in concept_mobjects:
                self.play(FadeIn(mob, shift=RIGHT), run_time=0.5)
                self.wait(0.3)
            self.wait(2)
            for mob in concept_mobjects:
                self.play(mob.animate.scale(1.2), rate_func=there_and_back, run_time=0.5)
            self.wait(1)
            self.play(FadeOut(group), FadeOut(title))
        else:
            self.wait(1)
            self.play(FadeOut(title))
"#,
        title = py_str(title),
        concepts = py_list(&concepts),
    )
}

/// Resumen animado de un segmento (color según categoría).
pub fn segment_animation(segment: &Segment, number: usize) -> String {
    let topic = segment.topic_or(number.saturating_sub(1));
    let category = segment.topic_category;
    let content = truncate_chars(&segment.content, 300);
    let concepts: Vec<String> = segment.key_concepts.iter().take(5).cloned().collect();
    let color = category.manim_color();

    format!(
        r#"from manim import *

class Segment{number}Animation(Scene):
    def construct(self):
        header = Text({header}, font_size=36, color={color})
        header.to_edge(UP)
        category_label = Text({category}, font_size=24, color=GRAY)
        category_label.next_to(header, DOWN)
        self.play(Write(header))
        self.play(FadeIn(category_label))
        self.wait(1)

        words = {content}.split()
        lines = []
        current_line = []
        for word in words:
            current_line.append(word)
            if len(" ".join(current_line)) > 45:
                lines.append(" ".join(current_line[:-1]))
                current_line = [word]
        if current_line:
            lines.append(" ".join(current_line))

        content_group = VGroup(*[Text(line, font_size=24) for line in lines[:6]])
        content_group.arrange(DOWN, aligned_edge=LEFT, buff=0.2)
        content_group.next_to(category_label, DOWN, buff=0.8)
        self.play(Write(content_group), run_time=2)
        self.wait(2)

        concepts = {concepts}
        if concepts:
            self.play(content_group.animate.scale(0.7).to_edge(LEFT))
            concepts_title = Text("Key Concepts:", font_size=28, color=YELLOW)
            concepts_title.to_edge(RIGHT).shift(UP * 1.5)
            self.play(Write(concepts_title))
            concept_group = VGroup(*[Text("- " + c, font_size=22, color={color}) for c in concepts])
            concept_group.arrange(DOWN, aligned_edge=LEFT, buff=0.3)
            concept_group.next_to(concepts_title, DOWN, buff=0.5)
            for c in concept_group:
                self.play(FadeIn(c, shift=LEFT), run_time=0.3)
            self.wait(2)

        self.play(*[FadeOut(mob) for mob in self.mobjects])
        self.wait(0.5)
"#,
        number = number,
        header = py_str(&format!("Segment {}: {}", number, truncate_with_suffix(&topic, 40, "..."))),
        category = py_str(&format!("[{}]", category.as_str())),
        color = color,
        content = py_str(&content),
        concepts = py_list(&concepts),
    )
}

fn segment_search_text(segment: &Segment) -> (String, String) {
    let content = segment.content.to_lowercase();
    let concepts = segment.key_concepts.join(" ").to_lowercase();
    (content, concepts)
}

/// ¿El segmento habla de física cuántica?
pub fn is_quantum_topic(segment: &Segment) -> bool {
    let (content, concepts) = segment_search_text(segment);
    let haystack = format!("{} {} {}", content, segment.topic.to_lowercase(), concepts);
    QUANTUM_KEYWORDS.iter().any(|kw| haystack.contains(kw)) || has_word(&haystack, QUANTUM_WORDS)
}

/// Plantilla para un segmento sin LLM: cuántica si corresponde, si no el resumen del segmento.
pub fn for_segment(segment: &Segment, number: usize) -> String {
    if is_quantum_topic(segment) {
        quantum_animation(segment, None)
    } else {
        segment_animation(segment, number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantumKind {
    Entanglement,
    Superposition,
    Tunneling,
    Interference,
    Decoherence,
    Measurement,
    Teleportation,
    WaveFunction,
    Bell,
    Epr,
}

impl QuantumKind {
    /// Detecta el tipo de fenómeno por palabras clave (default: entrelazamiento).
    pub fn detect(segment: &Segment) -> Self {
        let (content, concepts) = segment_search_text(segment);
        let has = |kws: &[&str]| {
            kws.iter()
                .any(|kw| content.contains(kw) || concepts.contains(kw))
        };
        let words = |ws: &[&str]| has_word(&content, ws) || has_word(&concepts, ws);

        if words(&["bell", "chsh"]) {
            QuantumKind::Bell
        } else if words(&["epr"]) || has(&["podolsky", "spooky action"]) {
            QuantumKind::Epr
        } else if has(&["entangle", "non-local", "correlated"]) {
            QuantumKind::Entanglement
        } else if has(&["superposition", "both states", "simultaneously"]) {
            QuantumKind::Superposition
        } else if has(&["tunnel", "barrier", "forbidden"]) {
            QuantumKind::Tunneling
        } else if has(&["interference", "double slit", "double-slit", "fringe"]) {
            QuantumKind::Interference
        } else if has(&["decoherence", "environment", "classical limit"]) {
            QuantumKind::Decoherence
        } else if has(&["measurement", "collapse", "observer"]) {
            QuantumKind::Measurement
        } else if has(&["teleport", "transfer"]) {
            QuantumKind::Teleportation
        } else if has(&["wave function", "psi", "schrodinger"]) {
            QuantumKind::WaveFunction
        } else {
            QuantumKind::Entanglement
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuantumKind::Entanglement => "entanglement",
            QuantumKind::Superposition => "superposition",
            QuantumKind::Tunneling => "tunneling",
            QuantumKind::Interference => "interference",
            QuantumKind::Decoherence => "decoherence",
            QuantumKind::Measurement => "measurement",
            QuantumKind::Teleportation => "teleportation",
            QuantumKind::WaveFunction => "wave_function",
            QuantumKind::Bell => "bell",
            QuantumKind::Epr => "epr",
        }
    }

    fn scene_name(&self) -> &'static str {
        match self {
            QuantumKind::Entanglement => "QuantumEntanglementAnimation",
            QuantumKind::Superposition => "SuperpositionAnimation",
            QuantumKind::Tunneling => "QuantumTunnelingAnimation",
            QuantumKind::Interference => "QuantumInterferenceAnimation",
            QuantumKind::Decoherence => "DecoherenceAnimation",
            QuantumKind::Measurement => "QuantumMeasurementAnimation",
            QuantumKind::Teleportation => "QuantumTeleportationAnimation",
            QuantumKind::WaveFunction => "WaveFunctionCollapseAnimation",
            QuantumKind::Bell => "BellInequalityAnimation",
            QuantumKind::Epr => "EPRParadoxAnimation",
        }
    }

    /// Cuerpo de `construct` (con 8 espacios de indentación) propio de cada fenómeno.
    fn body(&self) -> &'static str {
        match self {
            QuantumKind::Entanglement => {
                r#"        a = VGroup(Circle(radius=0.5, color=BLUE, fill_opacity=0.2), Circle(radius=0.3, color=BLUE, fill_opacity=0.8)).shift(LEFT * 3)
        b = VGroup(Circle(radius=0.5, color=RED, fill_opacity=0.2), Circle(radius=0.3, color=RED, fill_opacity=0.8)).shift(RIGHT * 3)
        self.play(GrowFromCenter(a), GrowFromCenter(b), run_time=1)
        link = DashedLine(a.get_center(), b.get_center(), color=YELLOW, dash_length=0.2)
        label = Text("Entangled", font_size=20, color=YELLOW).shift(UP * 0.5)
        self.play(Create(link), Write(label), run_time=1)
        spin_a = Arrow(a.get_center() + DOWN * 0.3, a.get_center() + UP * 0.3, buff=0, color=WHITE)
        spin_b = Arrow(b.get_center() + UP * 0.3, b.get_center() + DOWN * 0.3, buff=0, color=WHITE)
        self.play(GrowArrow(spin_a), GrowArrow(spin_b), run_time=0.5)
        note = Text("Measuring A fixes B instantly", font_size=20, color=GREEN).to_edge(DOWN, buff=0.8)
        self.play(Write(note), run_time=0.8)
        self.play(Rotate(spin_a, PI), Rotate(spin_b, PI), run_time=1)
        self.wait(1)
"#
            }
            QuantumKind::Superposition => {
                r#"        up = Text("|0>", font_size=40, color=BLUE).shift(LEFT * 2)
        down = Text("|1>", font_size=40, color=RED).shift(RIGHT * 2)
        plus = Text("+", font_size=40).move_to(ORIGIN)
        self.play(FadeIn(up), FadeIn(down), FadeIn(plus), run_time=1)
        cloud = Circle(radius=2.5, color=PURPLE, fill_opacity=0.15)
        self.play(GrowFromCenter(cloud), run_time=1)
        note = Text("Both states at once until observed", font_size=22, color=YELLOW).to_edge(DOWN, buff=0.8)
        self.play(Write(note), run_time=0.8)
        self.play(cloud.animate.scale(0.9), rate_func=there_and_back, run_time=1)
        self.wait(1)
"#
            }
            QuantumKind::Tunneling => {
                r#"        barrier = Rectangle(width=0.6, height=3, color=GRAY, fill_opacity=0.5)
        packet = Dot(radius=0.2, color=BLUE).shift(LEFT * 4)
        self.play(FadeIn(barrier), FadeIn(packet), run_time=0.8)
        self.play(packet.animate.shift(RIGHT * 3.4), run_time=1.2)
        ghost = Dot(radius=0.12, color=BLUE, fill_opacity=0.5).shift(RIGHT * 1)
        self.play(FadeIn(ghost), packet.animate.set_opacity(0.4), run_time=0.8)
        self.play(ghost.animate.shift(RIGHT * 2.5), run_time=1)
        note = Text("A particle can cross a classically forbidden barrier", font_size=20, color=YELLOW).to_edge(DOWN, buff=0.8)
        self.play(Write(note), run_time=0.8)
        self.wait(1)
"#
            }
            QuantumKind::Interference => {
                r#"        axes = Axes(x_range=[-4, 4], y_range=[0, 1.2], x_length=8, y_length=3).shift(DOWN * 0.5)
        pattern = axes.plot(lambda x: np.cos(2 * x) ** 2 * np.exp(-x ** 2 / 8), color=YELLOW)
        self.play(Create(axes), run_time=0.8)
        self.play(Create(pattern), run_time=1.5)
        note = Text("Paths add as amplitudes and form fringes", font_size=20, color=GREEN).to_edge(DOWN, buff=0.5)
        self.play(Write(note), run_time=0.8)
        self.wait(1)
"#
            }
            QuantumKind::Decoherence => {
                r#"        system = Circle(radius=0.8, color=BLUE, fill_opacity=0.4)
        self.play(GrowFromCenter(system), run_time=0.8)
        env = VGroup(*[Dot(radius=0.06, color=GRAY).move_to(2.5 * np.array([np.cos(t), np.sin(t), 0])) for t in np.linspace(0, 2 * PI, 16, endpoint=False)])
        self.play(FadeIn(env), run_time=0.8)
        self.play(system.animate.set_fill(GRAY, opacity=0.4).set_stroke(GRAY), run_time=1.5)
        note = Text("The environment washes out coherence", font_size=20, color=YELLOW).to_edge(DOWN, buff=0.8)
        self.play(Write(note), run_time=0.8)
        self.wait(1)
"#
            }
            QuantumKind::Measurement => {
                r#"        state = VGroup(Text("|0>", font_size=32, color=BLUE), Text("|1>", font_size=32, color=RED)).arrange(RIGHT, buff=1.5)
        self.play(FadeIn(state), run_time=0.8)
        detector = Rectangle(width=1.5, height=1, color=WHITE).shift(DOWN * 1.8)
        self.play(Create(detector), run_time=0.6)
        self.play(Flash(detector.get_center(), color=YELLOW), run_time=0.6)
        self.play(FadeOut(state[1]), state[0].animate.move_to(ORIGIN), run_time=1)
        note = Text("Observation selects one outcome", font_size=20, color=GREEN).to_edge(DOWN, buff=0.4)
        self.play(Write(note), run_time=0.8)
        self.wait(1)
"#
            }
            QuantumKind::Teleportation => {
                r#"        alice = Text("Alice", font_size=28, color=BLUE).shift(LEFT * 4 + UP)
        bob = Text("Bob", font_size=28, color=RED).shift(RIGHT * 4 + UP)
        self.play(Write(alice), Write(bob), run_time=0.8)
        qubit = Dot(radius=0.2, color=YELLOW).next_to(alice, DOWN)
        self.play(GrowFromCenter(qubit), run_time=0.5)
        channel = DashedLine(LEFT * 3, RIGHT * 3, color=PURPLE)
        self.play(Create(channel), run_time=0.8)
        copy = qubit.copy().next_to(bob, DOWN)
        self.play(FadeOut(qubit), FadeIn(copy), run_time=1.2)
        note = Text("State moves using entanglement plus two classical bits", font_size=20, color=GREEN).to_edge(DOWN, buff=0.8)
        self.play(Write(note), run_time=0.8)
        self.wait(1)
"#
            }
            QuantumKind::WaveFunction => {
                r#"        axes = Axes(x_range=[-4, 4], y_range=[0, 1.2], x_length=8, y_length=3)
        spread = axes.plot(lambda x: np.exp(-x ** 2 / 4), color=BLUE)
        peak = axes.plot(lambda x: np.exp(-x ** 2 * 8), color=RED)
        self.play(Create(axes), Create(spread), run_time=1.2)
        self.wait(0.5)
        self.play(Transform(spread, peak), run_time=1.2)
        note = Text("Measurement collapses the wave function", font_size=20, color=YELLOW).to_edge(DOWN, buff=0.5)
        self.play(Write(note), run_time=0.8)
        self.wait(1)
"#
            }
            QuantumKind::Bell => {
                r#"        source = Circle(radius=0.3, color=YELLOW, fill_opacity=0.8)
        det_a = Rectangle(width=1.2, height=0.8, color=BLUE, fill_opacity=0.3).shift(LEFT * 4)
        det_b = Rectangle(width=1.2, height=0.8, color=RED, fill_opacity=0.3).shift(RIGHT * 4)
        labels = VGroup(Text("Detector A", font_size=16, color=BLUE).next_to(det_a, UP, buff=0.2), Text("Detector B", font_size=16, color=RED).next_to(det_b, UP, buff=0.2))
        self.play(GrowFromCenter(source), Create(det_a), Create(det_b), Write(labels), run_time=1)
        for _ in range(3):
            photon_a = Dot(radius=0.1, color=BLUE).move_to(source)
            photon_b = Dot(radius=0.1, color=RED).move_to(source)
            self.play(photon_a.animate.move_to(det_a.get_center()), photon_b.animate.move_to(det_b.get_center()), run_time=0.5)
            self.play(FadeOut(photon_a), FadeOut(photon_b), run_time=0.3)
        classical = Rectangle(width=2, height=0.3, color=GREEN, fill_opacity=0.6).shift(DOWN * 1.5 + LEFT)
        quantum = Rectangle(width=2.8, height=0.3, color=PURPLE, fill_opacity=0.6).next_to(classical, DOWN, buff=0.2).align_to(classical, LEFT)
        self.play(GrowFromEdge(classical, LEFT), Write(Text("Classical bound", font_size=16, color=GREEN).next_to(classical, RIGHT, buff=0.2)), run_time=0.6)
        self.play(GrowFromEdge(quantum, LEFT), Write(Text("Quantum", font_size=16, color=PURPLE).next_to(quantum, RIGHT, buff=0.2)), run_time=0.6)
        note = Text("Correlations beat every local hidden variable model", font_size=20, color=YELLOW).to_edge(DOWN, buff=0.5)
        self.play(Write(note), run_time=0.8)
        self.wait(1)
"#
            }
            QuantumKind::Epr => {
                r#"        quote = Text("Spooky action at a distance", font_size=24, color=YELLOW).shift(UP * 2)
        self.play(Write(quote), run_time=1)
        self.wait(0.5)
        self.play(FadeOut(quote), run_time=0.5)
        source = Circle(radius=0.3, color=YELLOW, fill_opacity=0.8)
        a = Circle(radius=0.2, color=BLUE, fill_opacity=0.8)
        b = Circle(radius=0.2, color=RED, fill_opacity=0.8)
        self.play(GrowFromCenter(source), GrowFromCenter(a), GrowFromCenter(b), run_time=0.8)
        self.play(a.animate.shift(LEFT * 4), b.animate.shift(RIGHT * 4), run_time=1.5)
        distance = DoubleArrow(LEFT * 4, RIGHT * 4, color=GRAY, buff=0.3).shift(DOWN)
        self.play(Create(distance), run_time=0.6)
        spin_a = Arrow(a.get_center() + DOWN * 0.3, a.get_center() + UP * 0.3, buff=0, color=GREEN)
        self.play(Flash(a.get_center(), color=WHITE), GrowArrow(spin_a), run_time=0.8)
        link = Arrow(a.get_center(), b.get_center(), color=YELLOW, buff=0.3)
        spin_b = Arrow(b.get_center() + UP * 0.3, b.get_center() + DOWN * 0.3, buff=0, color=GREEN)
        self.play(GrowArrow(link), GrowArrow(spin_b), run_time=0.8)
        note = Text("Measuring A fixes the outcome at B", font_size=20, color=GREEN).to_edge(DOWN, buff=0.5)
        self.play(Write(note), run_time=0.8)
        self.wait(1)
"#
            }
        }
    }
}

/// Animación de física cuántica para el segmento; `kind = None` la detecta sola.
pub fn quantum_animation(segment: &Segment, kind: Option<QuantumKind>) -> String {
    let kind = kind.unwrap_or_else(|| QuantumKind::detect(segment));
    let title = if segment.topic.trim().is_empty() {
        "Quantum Concept".to_string()
    } else {
        truncate_chars(segment.topic.trim(), 50)
    };

    log::info!(
        "(quantum_animation) Plantilla '{}' para: {}",
        kind.as_str(),
        title
    );

    format!(
        r#"from manim import *
import numpy as np

class {scene}(Scene):
    def construct(self):
        title_text = Text({title}, font_size=32, color=BLUE)
        title_text.to_edge(UP, buff=0.4)
        self.play(Write(title_text), run_time=1)

{body}
        self.play(*[FadeOut(m) for m in self.mobjects])
        self.wait(0.5)
"#,
        scene = kind.scene_name(),
        title = py_str(&title),
        body = kind.body().trim_end(),
    )
}
