#![cfg(feature = "c-frontend")]

use c2pml::{compile, compile_json, frontend, Options};
use expect_test::expect;

fn pml(source: &str) -> String {
    compile(source, &Options::default()).unwrap()
}

#[test]
fn scalar_main() {
    let actual = pml("void main() { int x = 0; x++; }");
    expect![[r#"
        proctype main(chan in_main) {
            int x;
            x = 0;
            x = x + 1;
        end:
            printf("End of main\n");
            in_main ! 0;
        }

        init {
            chan ret_main = [0] of { bit };
            run main(ret_main);
            ret_main ? _;
        }
    "#]]
    .assert_eq(&actual);
}

#[test]
fn allocation_from_sizeof() {
    let actual = pml(
        "typedef struct node { int value; } node;
         void main() { int *p = malloc(sizeof(node)); }",
    );
    expect![[r#"
        typedef node {
            int value;
        }
        node node_mem[9];
        int node_valid[9];

        proctype main(chan in_main) {
            int p;
            int malloc_node_c;
            int tmp;
            atomic {
                malloc_node_c = 1;
                do
                :: (malloc_node_c >= 9) -> break
                :: else ->
                    if
                    :: (node_valid[malloc_node_c] == 0) ->
                        node_valid[malloc_node_c] = 1;
                        break
                    :: else -> malloc_node_c++
                    fi
                od;
                assert(malloc_node_c < 9);
                tmp = malloc_node_c;
            };
            p = tmp;
        end:
            printf("End of main\n");
            in_main ! 0;
        }

        init {
            chan ret_main = [0] of { bit };
            run main(ret_main);
            ret_main ? _;
        }
    "#]]
    .assert_eq(&actual);
}

#[test]
fn continue_moves_rest_into_else_arm() {
    let actual = pml(
        "void main() {
            int i = 0;
            int a = 0;
            int b = 0;
            while (i < 3) {
                i++;
                if (i == 2) { continue; }
                a = a + 1;
                b = b + 1;
            }
        }",
    );
    let fragment = "        if
        :: (i == 2) ->
            skip;
        :: else ->
            a = a + 1;
            b = b + 1;
        fi;
";
    assert!(actual.contains(fragment), "{}", actual);
    assert_eq!(actual.matches("a = a + 1;").count(), 1);
}

#[test]
fn every_return_sends_and_jumps() {
    let actual = pml(
        "int sign(int x) {
            if (x < 0) { return -1; }
            if (x == 0) { return 0; }
            return 1;
        }",
    );
    assert!(actual.starts_with("proctype sign(chan in_sign; int x) {\n"));
    assert_eq!(actual.matches("in_sign ! ").count(), 3);
    assert_eq!(actual.matches("goto end;").count(), 3);
    assert_eq!(actual.matches("\nend:\n").count(), 1);
    // no main, so nothing to start
    assert!(!actual.contains("init {"));
}

#[test]
fn value_call_waits_on_reply_channel() {
    let actual = pml(
        "int sum(int a, int b) { return a + b; }
         int main() { int r; r = sum(1, 2); return r; }",
    );
    assert!(actual.contains(
        "    chan ret_sum = [0] of { int };\n    run sum(ret_sum, 1, 2);\n    ret_sum ? r;\n"
    ));
    assert!(actual.contains("    in_main ! r;\n"));
    assert!(actual.contains("    chan ret_main = [0] of { int };\n"));
    assert!(!actual.contains("in_main ! 0;"));
}

#[test]
fn linked_list_push_and_pop() {
    let actual = pml(
        "struct node { int value; struct node *next; };
         struct node *head;

         void push(int v) {
             struct node *n = malloc(sizeof(struct node));
             n->value = v;
             n->next = head;
             head = n;
         }

         void pop() {
             struct node *n = head;
             if (n != NULL) {
                 head = n->next;
                 free(n);
             }
         }

         void main() { push(1); push(2); pop(); }",
    );
    assert!(actual.starts_with(
        "typedef node {\n    int value;\n    int next;\n}\nnode node_mem[9];\nint node_valid[9];\n\nint head;\n\n"
    ));
    assert!(actual.contains("proctype push(int v) {\n"));
    assert!(actual.contains("    node_mem[n].value = v;\n    node_mem[n].next = head;\n    head = n;\n"));
    assert!(actual.contains(":: (n != 0) ->\n        head = node_mem[n].next;\n        d_step {\n"));
    assert!(actual.contains("            node_valid[n] = 0;\n            node_mem[n].value = 0;\n            node_mem[n].next = 0;\n"));
    assert!(actual.contains("    run push(1);\n    run push(2);\n    run pop();\n"));
}

#[test]
fn unsupported_constructs_are_marked() {
    let actual = pml("void main() { int x = 0; do { x++; } while (x < 3); }");
    assert!(actual.contains("    /* unsupported: do { x++; } while (x < 3); */\n"));
    assert!(actual.contains("proctype main"));
}

#[test]
fn syntax_errors_are_fatal() {
    let err = compile("void main( {", &Options::default()).unwrap_err();
    assert!(err.to_string().starts_with("syntax error at "));
}

#[test]
fn translation_is_deterministic() {
    let source = "struct item { int v; };
                  int twice(int a) { return a * 2; }
                  void main() { int *p = malloc(sizeof(int)); *p = twice(3); }";
    assert_eq!(pml(source), pml(source));
}

#[test]
fn json_tree_matches_c_source() {
    let source = "int sum(int a, int b) { return a + b; }
                  void main() { int r; r = sum(2, 3); }";
    let program = frontend::c::parse(source).unwrap();
    let json = frontend::json::to_string(&program).unwrap();
    assert_eq!(
        compile_json(&json, &Options::default()).unwrap(),
        pml(source)
    );
}

#[test]
fn indentation_width_is_configurable() {
    let options = Options {
        indent_width: 2,
        emit_init: false,
    };
    let actual = compile("void main() { int x; }", &options).unwrap();
    assert_eq!(
        actual,
        "proctype main(chan in_main) {\n  int x;\nend:\n  printf(\"End of main\\n\");\n  in_main ! 0;\n}\n\n"
    );
}

#[test]
fn call_before_definition_runs_process() {
    let actual = pml(
        "int helper(int x);
         int main() { int r; r = helper(2); return r; }
         int helper(int x) { return x + 1; }",
    );
    assert!(actual.contains(
        "    chan ret_helper = [0] of { int };\n    run helper(ret_helper, 2);\n    ret_helper ? r;\n"
    ));
    assert!(actual.contains("proctype helper(chan in_helper; int x) {\n"));
    assert!(!actual.contains("unsupported"));
}

#[test]
fn recursive_call_inside_expression() {
    let actual = pml(
        "int fact(int n) {
            if (n <= 1) { return 1; }
            return n * fact(n - 1);
        }
        int main() { int r; r = fact(3) + 1; return r; }",
    );
    assert!(actual.contains(
        "    int val_fact;\n    chan ret_fact = [0] of { int };\n    run fact(ret_fact, n - 1);\n    ret_fact ? val_fact;\n    in_fact ! n * val_fact;\n"
    ));
    assert!(actual.contains(
        "    run fact(ret_fact, 3);\n    ret_fact ? val_fact;\n    r = val_fact + 1;\n"
    ));
    assert!(!actual.contains("unsupported"));
}

#[test]
fn call_in_guard_runs_before_if() {
    let actual = pml(
        "int f(int x) { return x + 1; }
         void main() { int x = 1; if (f(x) > 1) { x = 0; } }",
    );
    assert!(actual.contains(
        "    int val_f;\n    chan ret_f = [0] of { int };\n    run f(ret_f, x);\n    ret_f ? val_f;\n    if\n    :: (val_f > 1) ->\n        x = 0;\n    :: else -> skip\n    fi;\n"
    ));
    assert!(!actual.contains("unsupported"));
}

#[test]
fn braced_case_break_ends_case() {
    let actual = pml(
        "void main() {
            int x = 1;
            int y = 0;
            switch (x) { case 1: { y = 1; break; } default: y = 2; }
        }",
    );
    assert!(actual.contains(
        "    if\n    :: (x == 1) ->\n        y = 1;\n    :: else ->\n        y = 2;\n    fi;\n"
    ));
    assert!(!actual.contains("break"));
}
