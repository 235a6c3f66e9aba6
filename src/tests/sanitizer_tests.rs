//! tests/sanitizer_tests.rs
//! Limpieza del código Manim generado por el LLM.

#[cfg(test)]
mod tests {
    use crate::services::code_sanitizer::{
        brackets_balanced, clean_code_response, ensure_fadeouts_between_sections,
        ensure_valid_manim_code, extract_scene_name, inject_branding, sanitize_scene_name,
    };

    const SIMPLE_SCENE: &str = "from manim import *\n\nclass Demo(Scene):\n    def construct(self):\n        t = Text(\"hi\")\n        self.play(Write(t))\n";

    #[test]
    fn test_clean_extracts_python_block_and_fixes_typos() {
        let raw = "Here is your code:\n```python\nclass A(Scene):\n    def construct(self):\n        self.play(Fadein(x), run_time=0)\n        self.play(Fadeout(x))\n```\nEnjoy!";
        let code = clean_code_response(raw);

        assert!(code.starts_with("class A(Scene):"));
        assert!(!code.contains("```"));
        assert!(!code.contains("Enjoy"));
        assert!(code.contains("FadeIn(x), run_time=0.3)"));
        assert!(code.contains("FadeOut(x)"));
    }

    #[test]
    fn test_clean_replaces_latex_and_unicode() {
        let raw = "eq = MathTex(r\"a \\frac b\")\nlabel = Tex(\"x → y\")";
        let code = clean_code_response(raw);

        assert!(!code.contains("MathTex"));
        assert!(!code.contains("Tex("));
        assert_eq!(code.matches("Text(").count(), 2);
        assert!(code.contains("a / b"));
        assert!(code.contains("x -> y"));
    }

    #[test]
    fn test_clean_fixes_negative_and_zero_values() {
        let raw = "        self.play(*[])\n        self.play(Create(c), run_time=-2)\n        c.scale(0)\n        d.scale(-1.5)";
        let code = clean_code_response(raw);

        assert!(code.contains("pass  # empty animation removed"));
        assert!(code.contains("run_time=0.5"));
        assert!(code.contains(".scale(0.01)"));
        assert!(code.contains(".scale(0.5)"));
    }

    #[test]
    fn test_clean_truncates_very_long_text_literals() {
        let long = "x".repeat(120);
        let code = clean_code_response(&format!("t = Text(\"{}\")", long));
        assert!(code.contains(&format!("Text(\"{}...\"", "x".repeat(50))));
        assert!(!code.contains(&"x".repeat(51)));
    }

    #[test]
    fn test_ensure_valid_adds_imports_and_branding() {
        let code = ensure_valid_manim_code(
            "class A(Scene):\n    def construct(self):\n        self.play(Write(Text(\"hi\")))\n",
        );
        assert!(code.starts_with("from manim import *\nimport numpy as np\n"));
        assert!(code.contains("Animation by Xe-Bot"));
        assert!(code.contains("if self.mobjects:"));
    }

    #[test]
    fn test_ensure_valid_patches_api_misuse() {
        let code = ensure_valid_manim_code(
            "from manim import *\n\nclass A(Scene, Scene):\n    def construct(self):\n        BLUE = Circle(color=GREY)\n        print(\"debug\")\n        self.wait(0)\n        t = Text(\"\")\n        self.play(Create(BLUE))\n",
        );

        assert!(code.contains("class A(Scene):"));
        assert!(code.contains("        BLUE_VAR = Circle(color=GRAY)"));
        assert!(code.contains("        pass  # print removed"));
        assert!(code.contains("self.wait(0.1)"));
        assert!(code.contains("Text(\" \")"));
        assert!(!code.contains("GREY"));
    }

    #[test]
    fn test_ensure_valid_guards_mobject_fadeout() {
        let code = ensure_valid_manim_code(
            "from manim import *\n\nclass A(Scene):\n    def construct(self):\n        self.play(Write(Text(\"a\")))\n        self.play(*[FadeOut(m) for m in self.mobjects])\n",
        );
        assert!(code.contains(
            "        self.wait(0.5)\n        if self.mobjects: self.play(*[FadeOut(m) for m in self.mobjects if m is not None])"
        ));
    }

    #[test]
    fn test_ensure_valid_truncates_text_and_replaces_3d_objects() {
        let long = "y".repeat(70);
        let code = ensure_valid_manim_code(&format!(
            "from manim import *\n\nclass A(Scene):\n    def construct(self):\n        t = Text(\"{}\")\n        a = Arrow3D()\n        d = Dot3D()\n        self.play(Create(a))\n",
            long
        ));
        assert!(code.contains(&format!("Text(\"{}...\"", "y".repeat(57))));
        assert!(code.contains("a = Arrow()"));
        assert!(code.contains("d = Dot()"));
    }

    #[test]
    fn test_ensure_valid_without_scene_uses_generic_scene() {
        let code = ensure_valid_manim_code("x = 1\ny = 2\n");
        assert!(code.contains("class GeneratedScene(Scene):"));
        assert!(code.contains("Research Animation"));
        assert_eq!(code.matches("Animation by Xe-Bot").count(), 1);
    }

    #[test]
    fn test_ensure_valid_with_broken_syntax_uses_error_scene() {
        let code = ensure_valid_manim_code(
            "from manim import *\n\nclass A(Scene):\n    def construct(self):\n        self.play(Write(Text(\"a\"))\n",
        );
        assert!(code.contains("Animation Generation Error"));
        assert_eq!(extract_scene_name(&code), "GeneratedScene");
    }

    #[test]
    fn test_fadeouts_inserted_between_sections() {
        let code = "        seg_title = Text(\"Segment 1\")\n        self.play(Write(seg_title))\n        seg_title2 = Text(\"Segment 2\")\n        self.play(Write(seg_title2))";
        let out = ensure_fadeouts_between_sections(code);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2], "        self.play(*[FadeOut(m) for m in self.mobjects])");
        assert_eq!(out.matches("FadeOut(m)").count(), 1);
    }

    #[test]
    fn test_branding_goes_at_end_of_construct() {
        let code = "class A(Scene):\n    def construct(self):\n        self.play(Write(t))\n\n    def helper(self):\n        pass\n";
        let out = inject_branding(code);

        let branding = out.find("Animation by Xe-Bot").unwrap();
        let helper = out.find("def helper").unwrap();
        assert!(branding < helper);
        assert!(out.contains("        branding = Text(\"Animation by Xe-Bot\", font_size=36, color=BLUE)"));

        let appended = inject_branding(SIMPLE_SCENE);
        assert!(appended.trim_end().ends_with("self.play(FadeOut(branding))"));

        assert_eq!(inject_branding(&appended), appended);
    }

    #[test]
    fn test_brackets_balanced() {
        assert!(brackets_balanced("a = (1, [2, {3: 4}])"));
        assert!(brackets_balanced("x = ')'  # ("));
        assert!(brackets_balanced("s = \"\"\"multi\n(line\"\"\"\n"));
        assert!(!brackets_balanced("a = (1"));
        assert!(!brackets_balanced("a = [1)"));
        assert!(!brackets_balanced("s = 'unterminated\n"));
    }

    #[test]
    fn test_scene_names() {
        assert_eq!(extract_scene_name(SIMPLE_SCENE), "Demo");
        assert_eq!(extract_scene_name("class Cam(MovingCameraScene):"), "Cam");
        assert_eq!(extract_scene_name("class 3DPlot(Scene):"), "Scene3DPlot");
        assert_eq!(extract_scene_name("print(1)"), "GeneratedScene");

        assert_eq!(sanitize_scene_name("quantum entanglement-demo"), "QuantumEntanglementDemo");
        assert_eq!(sanitize_scene_name("already CamelCase"), "AlreadyCamelCase");
        assert_eq!(sanitize_scene_name("3d plot"), "Scene3dPlot");
        assert_eq!(sanitize_scene_name("!!!"), "GeneratedScene");
    }
}
