//! Peer label expressions.
//!
//! A label expression matches the processes of the apps bound to one plug or
//! slot. The broad `snap.<snap>.*` form is only used when every app of the
//! snap is bound; otherwise the expression names exactly the bound apps.

use confine_contracts::{
    interfaces::{PlugInfo, SlotInfo},
    security::LABEL_NAMESPACE,
};

/// Compute the label expression for `bound` apps out of `declared` apps of `snap`.
///
/// - exactly one bound: `snap.<snap>.<app>`
/// - every declared app bound: `snap.<snap>.*`
/// - otherwise: `snap.<snap>.{a,b,...}` in declared order
///
/// A snap with a single app therefore gets the exact form, never the
/// wildcard. Bound names the snap does not declare are ignored and
/// duplicates collapse, so the result depends only on the two sets and the
/// declared order. An empty bound set (with apps declared) gives
/// `snap.<snap>.{}`, which matches nothing.
pub fn app_label_expr<S: AsRef<str>>(snap: &str, declared: &[&str], bound: &[S]) -> String {
    let mut selected: Vec<&str> = Vec::new();
    let mut declared_count = 0;
    for (i, app) in declared.iter().enumerate() {
        if declared[..i].contains(app) {
            continue;
        }
        declared_count += 1;
        if bound.iter().any(|b| b.as_ref() == *app) {
            selected.push(*app);
        }
    }

    if selected.len() == 1 {
        format!("{LABEL_NAMESPACE}.{snap}.{}", selected[0])
    } else if selected.len() == declared_count {
        format!("{LABEL_NAMESPACE}.{snap}.*")
    } else {
        format!("{LABEL_NAMESPACE}.{snap}.{{{}}}", selected.join(","))
    }
}

/// Label expression for the apps bound to `plug`.
pub fn plug_app_label_expr(plug: &PlugInfo) -> String {
    app_label_expr(&plug.snap.name, &plug.snap.app_names(), &plug.apps)
}

/// Label expression for the apps bound to `slot`.
pub fn slot_app_label_expr(slot: &SlotInfo) -> String {
    app_label_expr(&slot.snap.name, &slot.snap.app_names(), &slot.apps)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use confine_contracts::snap::{AppInfo, SnapInfo};

    use super::*;

    #[test]
    fn all_bound_gives_wildcard() {
        assert_eq!(app_label_expr("unity8", &["a", "b"], &["a", "b"]), "snap.unity8.*");
    }

    #[test]
    fn some_bound_gives_alternation() {
        assert_eq!(
            app_label_expr("unity8", &["a", "b", "c"], &["a", "b"]),
            "snap.unity8.{a,b}"
        );
    }

    #[test]
    fn single_app_snap_gives_exact_form() {
        assert_eq!(app_label_expr("unity8", &["a"], &["a"]), "snap.unity8.a");
    }

    #[test]
    fn one_of_many_gives_exact_form() {
        assert_eq!(app_label_expr("unity8", &["a", "b"], &["b"]), "snap.unity8.b");
    }

    #[test]
    fn alternation_follows_declared_order_not_bound_order() {
        assert_eq!(
            app_label_expr("s", &["a", "b", "c", "d"], &["d", "b", "b"]),
            "snap.s.{b,d}"
        );
    }

    #[test]
    fn undeclared_bound_names_are_ignored() {
        assert_eq!(app_label_expr("s", &["a", "b", "c"], &["a", "zz"]), "snap.s.a");
    }

    #[test]
    fn empty_bound_set_matches_nothing() {
        let none: [&str; 0] = [];
        assert_eq!(app_label_expr("s", &["a", "b"], &none), "snap.s.{}");
    }

    /// Exhaustive check over every subset of up to five declared apps.
    #[test]
    fn form_is_chosen_by_subset_size() {
        let declared = ["a", "b", "c", "d", "e"];
        for n in 1..=declared.len() {
            let apps = &declared[..n];
            for mask in 1u32..(1 << n) {
                let bound: Vec<&str> = (0..n)
                    .filter(|i| mask & (1 << i) != 0)
                    .map(|i| apps[i])
                    .collect();
                let expr = app_label_expr("p", apps, &bound);
                if bound.len() == 1 {
                    assert_eq!(expr, format!("snap.p.{}", bound[0]));
                } else if bound.len() == n {
                    assert_eq!(expr, "snap.p.*");
                } else {
                    assert_eq!(expr, format!("snap.p.{{{}}}", bound.join(",")));
                }
            }
        }
    }

    #[test]
    fn plug_and_slot_helpers_use_snap_declarations() {
        let snap = Arc::new(
            SnapInfo::new("shell")
                .with_app(AppInfo::new("app1"))
                .with_app(AppInfo::new("app2"))
                .with_app(AppInfo::new("app3")),
        );
        let plug = PlugInfo::new(&snap, "p", "unity8").with_apps(["app2", "app1"]);
        assert_eq!(plug_app_label_expr(&plug), "snap.shell.{app1,app2}");

        let slot = SlotInfo::new(&snap, "s", "unity8").with_all_apps();
        assert_eq!(slot_app_label_expr(&slot), "snap.shell.*");
    }
}
