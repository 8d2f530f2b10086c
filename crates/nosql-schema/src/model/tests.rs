use super::*;
use crate::SchemaBuilder;

struct Tree {
    model: Datamodel,
    schema: SchemaId,
    table: TableId,
}

/// `s.t` with columns `a`, `b`, `c`
fn tree() -> Tree {
    let mut model = Datamodel::new("m").unwrap();
    let schema = SchemaBuilder::new_schema(&mut model, "s", false).unwrap();
    let table = SchemaBuilder::new_table(&mut model, Some(schema), "t", false).unwrap();
    for name in ["a", "b", "c"] {
        SchemaBuilder::new_field(&mut model, Some(table), name, false).unwrap();
    }
    Tree {
        model,
        schema,
        table,
    }
}

fn flag(tree: &mut Tree, name: &str, primary: bool, shard: bool) {
    let id = tree.model.field_named(tree.table, name).unwrap();
    let f = tree.model.field_mut(id).unwrap();
    f.set_primary_key(primary);
    f.set_shard_key(shard);
}

mod key_group_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_groups_follow_declaration_order() {
        let mut t = tree();
        flag(&mut t, "c", true, true);
        flag(&mut t, "a", true, false);
        let pk = t.model.primary_key(t.table).unwrap();
        assert_eq!(t.model.group_names(&pk), vec!["a", "c"]);
        let shard = t.model.shard_key(t.table).unwrap();
        assert_eq!(t.model.group_names(&shard), vec!["c"]);
    }

    #[test]
    fn test_groups_reflect_current_flags() {
        let mut t = tree();
        flag(&mut t, "a", true, true);
        flag(&mut t, "b", true, true);
        assert_eq!(t.model.primary_key(t.table).unwrap().len(), 2);

        flag(&mut t, "b", false, false);
        let shard = t.model.shard_key(t.table).unwrap();
        assert_eq!(t.model.group_names(&shard), vec!["a"]);
        assert_eq!(shard.table(), Some(t.table));
    }

    #[test]
    fn test_removed_field_leaves_groups() {
        let mut t = tree();
        flag(&mut t, "a", true, true);
        flag(&mut t, "b", true, true);
        t.model.remove_field(t.table, "A").unwrap();
        let pk = t.model.primary_key(t.table).unwrap();
        assert_eq!(t.model.group_names(&pk), vec!["b"]);
    }
}

mod ownership_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duplicate_table_on_add() {
        let mut t = tree();
        let other = t.model.create_table("T").unwrap();
        let err = t.model.add_table(t.schema, other, false).unwrap_err();
        match err {
            NosqlError::DuplicateElement { kind, name } => {
                assert_eq!(kind, ElementKind::Table);
                assert_eq!(name, "t");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(t.model[t.schema].table_count(), 1);
        assert_eq!(t.model[other].owner(), None);
    }

    #[test]
    fn test_field_of_other_table_is_rejected() {
        let mut t = tree();
        let second = SchemaBuilder::new_table(&mut t.model, Some(t.schema), "u", false).unwrap();
        let a = t.model.field_named(t.table, "a").unwrap();
        let err = t.model.add_field(second, a, false).unwrap_err();
        assert!(matches!(err, NosqlError::InvalidArgument(ref m) if m.contains("another owner")));
    }

    #[test]
    fn test_readding_to_same_owner_with_overwrite() {
        let mut t = tree();
        let b = t.model.field_named(t.table, "b").unwrap();
        t.model.add_field(t.table, b, true).unwrap();
        assert_eq!(t.model[t.table].field_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_positional_lookup() {
        let t = tree();
        let second = t.model.field_at(t.table, 1).unwrap();
        assert_eq!(t.model[second].name(), "b");
        let err = t.model.field_at(t.table, 3).unwrap_err();
        assert!(matches!(err, NosqlError::NoSuchElement { ref name, .. } if name == "#3"));
    }

    #[test]
    fn test_remove_schema_drops_tables() {
        let mut t = tree();
        t.model.remove_schema("S").unwrap();
        assert_eq!(t.model.schema_count(), 0);
        assert!(t.model.get_table(t.table).is_none());
    }

    #[test]
    fn test_table_by_path_without_source() {
        let mut t = tree();
        assert_eq!(t.model.table_by_path("s", "T").unwrap(), t.table);
        assert!(t.model.table_by_path("s", "missing").unwrap_err().is_no_such_element());
        assert!(t.model.table_by_path("nope", "t").unwrap_err().is_no_such_element());
    }
}

mod index_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_index_terms_do_not_count_as_fields() {
        let mut t = tree();
        let index = SchemaBuilder::new_index(&mut t.model, Some(t.table), "i", false).unwrap();
        let b = t.model.field_named(t.table, "b").unwrap();
        let term = t.model.add_index_term(t.table, "info.x").unwrap();
        assert!(t.model.add_index_field(index, b).unwrap());
        assert!(t.model.add_index_field(index, term).unwrap());
        assert!(!t.model.add_index_field(index, b).unwrap());

        assert_eq!(t.model[t.table].field_count(), 3);
        assert_eq!(t.model[index].field_count(), 2);
        assert_eq!(t.model[term].owner(), Some(t.table));
        assert!(t.model.field_named(t.table, "info.x").is_err());
    }

    #[test]
    fn test_removing_index_drops_its_terms() {
        let mut t = tree();
        let index = SchemaBuilder::new_index(&mut t.model, Some(t.table), "i", false).unwrap();
        let b = t.model.field_named(t.table, "b").unwrap();
        let term = t.model.add_index_term(t.table, "info.x").unwrap();
        t.model.add_index_field(index, b).unwrap();
        t.model.add_index_field(index, term).unwrap();

        t.model.remove_index(t.table, "I").unwrap();
        assert!(t.model.get_field(term).is_none());
        assert!(!t.model[b].is_index_key());
        assert!(t.model[t.table].index_terms.is_empty());
    }

    #[test]
    fn test_index_rejects_field_of_other_table() {
        let mut t = tree();
        let other = SchemaBuilder::new_table(&mut t.model, Some(t.schema), "u", false).unwrap();
        let x = SchemaBuilder::new_field(&mut t.model, Some(other), "x", false).unwrap();
        let index = SchemaBuilder::new_index(&mut t.model, Some(t.table), "i", false).unwrap();
        assert!(t.model.add_index_field(index, x).is_err());
    }

    #[test]
    fn test_detached_index_group_rejects_fields() {
        let mut t = tree();
        let index = SchemaBuilder::new_index(&mut t.model, None, "loose", false).unwrap();
        let a = t.model.field_named(t.table, "a").unwrap();
        assert!(t.model.add_index_field(index, a).is_err());
    }

    #[test]
    fn test_remove_all_children() {
        let mut t = tree();
        let index = SchemaBuilder::new_index(&mut t.model, Some(t.table), "i", false).unwrap();
        let a = t.model.field_named(t.table, "a").unwrap();
        t.model.add_index_field(index, a).unwrap();

        t.model.remove_all_children(t.table).unwrap();
        assert_eq!(t.model[t.table].field_count(), 0);
        assert_eq!(t.model[t.table].index_count(), 0);
        assert!(t.model.get_field(a).is_none());
        assert!(t.model.get_index(index).is_none());
    }
}

mod fetch_state_tests {
    use super::*;

    #[test]
    fn test_new_elements_are_unfetched() {
        let t = tree();
        assert!(!t.model.is_fetched());
        assert!(!t.model[t.schema].is_fetched());
        assert!(!t.model[t.table].is_fetched());
    }

    #[test]
    fn test_mark_table_fetched_covers_children() {
        let mut t = tree();
        let index = SchemaBuilder::new_index(&mut t.model, Some(t.table), "i", false).unwrap();
        t.model.mark_table_fetched(t.table);
        assert!(t.model[t.table].is_fetched());
        assert!(t.model.table_fields(t.table).unwrap().iter().all(|f| f.is_fetched()));
        assert!(t.model[index].is_fetched());
    }
}
