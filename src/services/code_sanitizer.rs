//! services/code_sanitizer.rs
//! Limpieza y "blindaje" del código Manim que devuelve el LLM antes de renderizarlo.

use regex::{Captures, Regex};

use crate::services::templates;
use crate::utils::truncate_chars;

/// Compila el regex una sola vez.
macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| Regex::new($re).expect("regex inválido"))
    }};
}

pub const BRANDING_TEXT: &str = "Animation by Xe-Bot";
pub const DEFAULT_SCENE_NAME: &str = "GeneratedScene";

const LATEX_WORDS: &[(&str, &str)] = &[
    ("\\frac", "/"),
    ("\\sum", "sum"),
    ("\\int", "integral"),
    ("\\alpha", "alpha"),
    ("\\beta", "beta"),
    ("\\gamma", "gamma"),
    ("\\theta", "theta"),
    ("\\delta", "delta"),
    ("\\pi", "pi"),
    ("\\infty", "infinity"),
    ("\\rightarrow", "->"),
    ("\\leftarrow", "<-"),
    ("\\times", "x"),
    ("\\cdot", "*"),
];

const BASIC_UNICODE: &[(&str, &str)] = &[
    ("→", "->"),
    ("←", "<-"),
    ("•", "-"),
    ("…", "..."),
    ("\u{201C}", "\""),
    ("\u{201D}", "\""),
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
];

const EXTENDED_UNICODE: &[(&str, &str)] = &[
    ("≈", "~"),
    ("≠", "!="),
    ("≤", "<="),
    ("≥", ">="),
    ("–", "-"),
    ("—", "-"),
    ("α", "alpha"),
    ("β", "beta"),
    ("γ", "gamma"),
    ("Δ", "Delta"),
    ("δ", "delta"),
    ("θ", "theta"),
    ("λ", "lambda"),
    ("π", "pi"),
    ("σ", "sigma"),
    ("μ", "mu"),
    ("ψ", "psi"),
    ("∞", "infinity"),
    ("∑", "sum"),
];

fn replace_pairs(code: &str, pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .fold(code.to_string(), |acc, (from, to)| acc.replace(from, to))
}

fn sub(re: &Regex, code: &str, rep: &str) -> String {
    re.replace_all(code, rep).into_owned()
}

/// Corta los literales de `Text("...")` con `min` caracteres o más.
fn limit_text_literals(code: &str, re: &Regex, keep: usize) -> String {
    re.replace_all(code, |caps: &Captures| {
        format!("Text(\"{}...\"", truncate_chars(&caps[1], keep))
    })
    .into_owned()
}

fn latex_to_text(code: &str) -> String {
    let code = sub(regex!(r"MathTex\s*\("), code, "Text(");
    sub(regex!(r"\bTex\s*\("), &code, "Text(")
}

/// Extrae el bloque de código de la respuesta del LLM y corrige los errores
/// más comunes que hacen caer a Manim.
pub fn clean_code_response(raw: &str) -> String {
    let mut code = raw.trim().to_string();

    if code.contains("```python") {
        if let Some(caps) = regex!(r"(?s)```python\s*\n(.*?)```").captures(&code) {
            code = caps[1].to_string();
        }
    } else if code.contains("```") {
        if let Some(caps) = regex!(r"(?s)```\s*\n(.*?)```").captures(&code) {
            code = caps[1].to_string();
        }
    }

    // restos de fences
    code = sub(regex!(r"^```\w*\n?"), &code, "");
    code = sub(regex!(r"\n?```\s*$"), &code, "");

    code = latex_to_text(&code);
    code = replace_pairs(&code, LATEX_WORDS);

    code = sub(
        regex!(r"(?m)^([ \t]*)self\.play\(\*\[\s*\]\)"),
        &code,
        "${1}pass  # empty animation removed",
    );

    code = sub(regex!(r"run_time\s*=\s*0([,\)])"), &code, "run_time=0.3${1}");
    code = sub(regex!(r"run_time\s*=\s*-[\d.]+"), &code, "run_time=0.5");

    code = sub(regex!(r"\.scale\(\s*0\s*\)"), &code, ".scale(0.01)");
    code = sub(regex!(r"\.scale\(\s*-[\d.]+\s*\)"), &code, ".scale(0.5)");

    code = sub(regex!(r"\bFadeout\b"), &code, "FadeOut");
    code = sub(regex!(r"\bFadein\b"), &code, "FadeIn");
    code = sub(regex!(r"\bGrowarrow\b"), &code, "GrowArrow");

    code = replace_pairs(&code, BASIC_UNICODE);

    code = sub(
        regex!(r"def construct\(self\)[ \t]*\n"),
        &code,
        "def construct(self):\n",
    );

    code = limit_text_literals(&code, regex!(r#"Text\(["']([^"'\n]{100,})["']"#), 50);

    code.trim().to_string()
}

/// Deja el código listo para manim: imports, parches de API, textos cortos,
/// escena válida y branding al final.
pub fn ensure_valid_manim_code(code: &str) -> String {
    let mut code = code.to_string();

    if !code.contains("from manim import") && !code.contains("import manim") {
        code = format!("from manim import *\nimport numpy as np\n\n{}", code);
    }
    if !code.contains("import numpy") && code.contains("np.") {
        code = format!("import numpy as np\n{}", code);
    }

    code = latex_to_text(&code);
    code = sub(regex!(r"\\\\frac\{[^}]*\}\{[^}]*\}"), &code, "fraction");
    code = sub(regex!(r"\\\\[a-zA-Z]+\{[^}]*\}"), &code, "");
    code = sub(regex!(r"\$[^$\n]+\$"), &code, "");

    code = replace_pairs(&code, BASIC_UNICODE);
    code = replace_pairs(&code, EXTENDED_UNICODE);

    // animaciones vacías
    code = sub(
        regex!(r"(?m)^([ \t]*)self\.play\(\*\[\s*\]\)"),
        &code,
        "${1}pass  # empty animation removed",
    );
    code = sub(
        regex!(r"(?m)^([ \t]*)self\.play\(\*\[Fade(?:Out|In)\(m\) for m in \[\]\]\)"),
        &code,
        "${1}pass  # empty fade removed",
    );

    code = sub(regex!(r"run_time\s*=\s*0([,\)])"), &code, "run_time=0.1${1}");
    code = sub(regex!(r"run_time\s*=\s*-[\d.]+"), &code, "run_time=0.5");
    code = sub(regex!(r"\.scale\(\s*0\s*\)"), &code, ".scale(0.01)");
    code = sub(regex!(r"\.scale\(\s*-[\d.]+\s*\)"), &code, ".scale(0.5)");

    code = sub(regex!(r"\b(?:Fadeout|fadeout)\b"), &code, "FadeOut");
    code = sub(regex!(r"\b(?:Fadein|fadein)\b"), &code, "FadeIn");
    code = sub(regex!(r"\bGrowarrow\b"), &code, "GrowArrow");

    // no pisar las constantes de color de manim
    code = sub(
        regex!(r"(?m)^([ \t]*)(WHITE|BLUE|RED)[ \t]*=([^=])"),
        &code,
        "${1}${2}_VAR =${3}",
    );

    code = sub(
        regex!(r"class\s+(\w+)\s*\(\s*Scene\s*,\s*Scene\s*\)"),
        &code,
        "class ${1}(Scene)",
    );

    code = limit_text_literals(&code, regex!(r#"Text\(["']([^"'\n]{61,})["']"#), 57);

    code = ensure_fadeouts_between_sections(&code);
    code = sub(
        regex!(r"(?m)^([ \t]*)self\.play\(\*\[FadeOut\(m\) for m in self\.mobjects\]\)"),
        &code,
        "${1}self.wait(0.5)\n${1}if self.mobjects: self.play(*[FadeOut(m) for m in self.mobjects if m is not None])",
    );

    // división por cero literal
    code = sub(regex!(r"/\s*0([^\d.])"), &code, "/1${1}");

    code = sub(regex!(r"LaggedStart\(\*\[\s*\]"), &code, "LaggedStart(*[Wait(0.1)]");
    code = sub(regex!(r"Flash\(\s*\)"), &code, "Flash(ORIGIN)");

    if !code.contains("ThreeDScene") && (code.contains("Arrow3D") || code.contains("Dot3D")) {
        code = code.replace("Arrow3D", "Arrow").replace("Dot3D", "Dot");
    }

    code = sub(
        regex!(r"(?m)^([ \t]*)print\(.*\)[ \t]*$"),
        &code,
        "${1}pass  # print removed",
    );

    code = code.replace("GREY", "GRAY");

    code = sub(regex!(r"self\.wait\(\s*0\s*\)"), &code, "self.wait(0.1)");
    code = sub(regex!(r"self\.wait\(\s*-[\d.]+\s*\)"), &code, "self.wait(0.5)");

    code = sub(regex!(r#"Text\(\s*(?:""|'')?\s*\)"#), &code, "Text(\" \")");
    code = sub(regex!(r"VGroup\(\s*None\s*\)"), &code, "VGroup()");

    if !code.contains("class") || !code.contains("Scene") {
        log::warn!("(ensure_valid_manim_code) Sin clase Scene, se usa escena genérica");
        code = templates::generic_scene();
    }

    if !brackets_balanced(&code) {
        log::warn!("(ensure_valid_manim_code) Paréntesis/comillas desbalanceados, se usa escena de error");
        code = templates::error_scene();
    }

    inject_branding(&code)
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Agrega un fade-out de toda la pantalla antes de cada título de sección nuevo,
/// para que los textos no se encimen.
pub fn ensure_fadeouts_between_sections(code: &str) -> String {
    let section_title = regex!(
        r#"(?i)=\s*Text\(["'](?:Segment|Section|Background|Problem|Approach|Method|Result|Conclusion)"#
    );

    let mut out = Vec::new();
    let mut screen_clear = true;

    for line in code.lines() {
        let stripped = line.trim();
        let lower = stripped.to_lowercase();
        let is_new_section = lower.contains("seg_title")
            || (lower.contains("segment") && stripped.contains("Text("))
            || section_title.is_match(stripped);

        if is_new_section && !screen_clear {
            out.push(format!(
                "{}self.play(*[FadeOut(m) for m in self.mobjects])",
                " ".repeat(indent_of(line))
            ));
            screen_clear = true;
        }
        out.push(line.to_string());

        if stripped.contains("FadeOut") && stripped.contains("self.mobjects") {
            screen_clear = true;
        } else if stripped.contains("self.play(") || stripped.contains("self.wait(") {
            screen_clear = false;
        }
    }

    out.join("\n")
}

fn branding_block(indent: &str) -> Vec<String> {
    [
        "",
        "# Xe-Bot branding",
        "if self.mobjects: self.play(*[FadeOut(mob) for mob in self.mobjects if mob is not None])",
        "branding = Text(\"Animation by Xe-Bot\", font_size=36, color=BLUE)",
        "self.play(FadeIn(branding))",
        "self.wait(2)",
        "self.play(FadeOut(branding))",
    ]
    .iter()
    .map(|l| {
        if l.is_empty() {
            String::new()
        } else {
            format!("{}{}", indent, l)
        }
    })
    .collect()
}

/// Inserta el cierre "Animation by Xe-Bot" al final de `construct` si no está.
pub fn inject_branding(code: &str) -> String {
    if code.contains("Xe-Bot") {
        return code.to_string();
    }

    let mut out: Vec<String> = Vec::new();
    let mut construct_indent: Option<usize> = None;
    let mut injected = false;

    for line in code.lines() {
        if !injected {
            if let Some(base) = construct_indent {
                let stripped = line.trim();
                if !stripped.is_empty() && !stripped.starts_with('#') && indent_of(line) <= base {
                    // fin del método: insertar antes de las líneas en blanco finales
                    let trailing_blank = out.iter().rev().take_while(|l| l.trim().is_empty()).count();
                    let at = out.len() - trailing_blank;
                    for (k, l) in branding_block(&" ".repeat(base + 4)).into_iter().enumerate() {
                        out.insert(at + k, l);
                    }
                    injected = true;
                }
            } else if line.contains("def construct(self") {
                construct_indent = Some(indent_of(line));
            }
        }
        out.push(line.to_string());
    }

    match construct_indent {
        Some(base) if !injected => {
            while out.last().map(|l| l.trim().is_empty()).unwrap_or(false) {
                out.pop();
            }
            out.extend(branding_block(&" ".repeat(base + 4)));
            out.join("\n") + "\n"
        }
        _ => out.join("\n"),
    }
}

/// Chequeo sintáctico liviano: paréntesis, corchetes y llaves balanceados y
/// strings cerrados (ignora comentarios y contenido de strings).
pub fn brackets_balanced(code: &str) -> bool {
    let chars: Vec<char> = code.chars().collect();
    let mut stack: Vec<char> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '"' | '\'' => {
                let triple = chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c);
                i += if triple { 3 } else { 1 };
                let mut closed = false;
                while i < chars.len() {
                    let d = chars[i];
                    if d == '\\' {
                        i += 2;
                        continue;
                    }
                    if d == '\n' && !triple {
                        return false;
                    }
                    if d == c {
                        if !triple {
                            i += 1;
                            closed = true;
                            break;
                        }
                        if chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c) {
                            i += 3;
                            closed = true;
                            break;
                        }
                    }
                    i += 1;
                }
                if !closed {
                    return false;
                }
                continue;
            }
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return false;
                }
            }
            _ => {}
        }
        i += 1;
    }

    stack.is_empty()
}

fn clean_identifier(name: &str) -> String {
    let name: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    match name.chars().next() {
        Some(first) if first.is_ascii_digit() => format!("Scene{}", name),
        _ => name,
    }
}

/// Nombre de la primera clase Scene del código (o `GeneratedScene`).
pub fn extract_scene_name(code: &str) -> String {
    regex!(r"class\s+(\w+)\s*\(\s*(?:Scene|MovingCameraScene|ThreeDScene|ZoomedScene)")
        .captures(code)
        .map(|caps| clean_identifier(&caps[1]))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_SCENE_NAME.to_string())
}

/// Convierte texto libre en un nombre de clase CamelCase válido.
pub fn sanitize_scene_name(name: &str) -> String {
    let cleaned = clean_identifier(&name.replace([' ', '-'], "_"));
    let camel: String = cleaned
        .split('_')
        .filter(|p| !p.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if camel.is_empty() {
        DEFAULT_SCENE_NAME.to_string()
    } else {
        camel
    }
}
