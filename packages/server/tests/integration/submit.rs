use registry_server::config::RegistryConfig;
use serde_json::json;

use crate::common::{GitFixture, TestApp, descriptor, routes};

mod submission {
    use super::*;

    #[tokio::test]
    async fn contributor_can_submit_a_repository() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let repo = GitFixture::plugin("peak-caller");

        let res = app.submit(&repo.url(), &token).await;

        assert_eq!(res.body["id"], "peak-caller");
        assert_eq!(res.body["name"], "Plugin peak-caller");
        assert_eq!(res.body["version"], "1.0.0");
        assert_eq!(res.body["status"], "pending");
        assert_eq!(res.body["repository"], repo.url());
        assert_eq!(res.body["commit_hash"], repo.head());
        assert_eq!(res.body["requires_auth"], false);
        assert_eq!(res.body["author"]["name"], "Lab Team");
        assert_eq!(res.body["category"]["name"], "analysis");
        assert_eq!(res.body["tags"], json!(["proteomics", "qc"]));
        assert_eq!(res.body["submitted_by"], app.user_id("alice").await);
    }

    #[tokio::test]
    async fn components_are_normalized_in_declaration_order() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let repo = GitFixture::plugin("peak-caller");

        let res = app.submit(&repo.url(), &token).await;

        assert_eq!(res.body["runtime"]["environments"], json!(["python"]));
        assert_eq!(res.body["runtime"]["entrypoint"], "main.py");

        let inputs = res.body["inputs"].as_array().unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0]["name"], "input_file");
        assert_eq!(inputs[0]["type"], "file");
        assert_eq!(inputs[0]["required"], true);
        assert_eq!(inputs[0]["file_types"], json!([".csv", ".tsv"]));
        assert_eq!(inputs[1]["name"], "threshold");
        assert_eq!(inputs[1]["default"], "0.05");
        assert_eq!(inputs[1]["max"], 1.0);

        let outputs = res.body["outputs"].as_array().unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0]["path"], "report.html");
    }

    #[tokio::test]
    async fn readme_is_rendered_with_a_synthesized_diagram() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let repo = GitFixture::plugin("peak-caller");

        let res = app.submit(&repo.url(), &token).await;

        let readme = res.body["readme"].as_str().unwrap();
        assert!(readme.contains("<h1>peak-caller</h1>"), "{readme}");
        assert!(readme.contains("<table>"), "{readme}");
        assert!(readme.contains("<pre class=\"mermaid\">"), "{readme}");
        assert!(readme.contains("Loading data"), "{readme}");
        assert!(readme.contains("Writing report"), "{readme}");
    }

    #[tokio::test]
    async fn readme_with_its_own_diagram_is_left_alone() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let repo = GitFixture::plugin("peak-caller");
        repo.write(
            "README.md",
            "# Tool\n\n```mermaid\nflowchart TD\n    A --> B\n```\n",
        );
        repo.commit("own diagram");

        let res = app.submit(&repo.url(), &token).await;

        let readme = res.body["readme"].as_str().unwrap();
        assert_eq!(readme.matches("<pre class=\"mermaid\">").count(), 1);
        assert!(!readme.contains("Loading data"));
    }

    #[tokio::test]
    async fn auto_approve_publishes_immediately() {
        let app = TestApp::spawn_with(RegistryConfig {
            auto_approve: true,
            ..Default::default()
        })
        .await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let repo = GitFixture::plugin("peak-caller");

        let res = app.submit(&repo.url(), &token).await;

        assert_eq!(res.body["status"], "approved");
    }
}

mod resubmission {
    use super::*;

    #[tokio::test]
    async fn resubmitting_updates_the_existing_plugin() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let repo = GitFixture::plugin("peak-caller");
        app.submit(&repo.url(), &token).await;

        repo.write("plugin.yaml", &descriptor("peak-caller", "Peak Caller", "1.1.0"));
        let head = repo.commit("bump");

        let res = app
            .post_with_token(routes::SUBMIT, &json!({"repo_url": repo.url()}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Peak Caller");
        assert_eq!(res.body["version"], "1.1.0");
        assert_eq!(res.body["commit_hash"], head);
        assert_eq!(res.body["inputs"].as_array().unwrap().len(), 2);
        assert_eq!(res.body["tags"], json!(["proteomics", "qc"]));
    }

    #[tokio::test]
    async fn another_contributor_cannot_overwrite_a_plugin() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        let repo = GitFixture::plugin("peak-caller");
        app.submit(&repo.url(), &alice).await;

        let res = app
            .post_with_token(routes::SUBMIT, &json!({"repo_url": repo.url()}), &bob)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn staff_refresh_keeps_submitter_and_status() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let admin = app.create_admin("admin").await;
        let repo = GitFixture::plugin("peak-caller");
        app.submit(&repo.url(), &alice).await;

        repo.write("plugin.yaml", &descriptor("peak-caller", "Renamed", "2.0.0"));
        repo.commit("rename");

        let res = app
            .post_with_token(&routes::refresh("peak-caller"), &json!({}), &admin)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Renamed");
        assert_eq!(res.body["status"], "pending");
        assert_eq!(res.body["submitted_by"], app.user_id("alice").await);
    }

    #[tokio::test]
    async fn non_owner_cannot_refresh() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        let repo = GitFixture::plugin("peak-caller");
        app.submit(&repo.url(), &alice).await;

        let res = app
            .post_with_token(&routes::refresh("peak-caller"), &json!({}), &bob)
            .await;

        assert_eq!(res.status, 403);
    }
}

mod rejected_submissions {
    use super::*;

    #[tokio::test]
    async fn repository_without_descriptor_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let repo = GitFixture::plugin("peak-caller");
        repo.remove("plugin.yaml");
        repo.commit("drop descriptor");

        let res = app
            .post_with_token(routes::SUBMIT, &json!({"repo_url": repo.url()}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "DESCRIPTOR_NOT_FOUND");
        assert_eq!(res.body["error"], "plugin.yaml not found in the repository.");
    }

    #[tokio::test]
    async fn descriptor_without_id_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let repo = GitFixture::empty();
        repo.write("plugin.yaml", "plugin:\n  name: Nameless\n");
        repo.commit("no id");

        let res = app
            .post_with_token(routes::SUBMIT, &json!({"repo_url": repo.url()}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["error"], "Plugin ID not found in plugin.yaml.");

        let mine = app.get_with_token(routes::MY_PLUGINS, &token).await;
        assert_eq!(mine.body, json!([]));
    }

    #[tokio::test]
    async fn malformed_url_is_rejected_before_cloning() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        for url in ["", "not a url", "ftp://example.com/repo.git", "--upload-pack=evil"] {
            let res = app
                .post_with_token(routes::SUBMIT, &json!({"repo_url": url}), &token)
                .await;
            assert_eq!(res.status, 400, "{url}: {}", res.text);
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn unreachable_repository_reports_clone_failure() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let missing = tempfile::tempdir().unwrap();
        let url = format!("file://{}/nothing-here", missing.path().display());

        let res = app
            .post_with_token(routes::SUBMIT, &json!({"repo_url": url}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "REPOSITORY_ERROR");
        assert!(
            res.body["error"]
                .as_str()
                .unwrap()
                .starts_with("Failed to clone repository")
        );
    }

    #[tokio::test]
    async fn anonymous_submission_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::SUBMIT, &json!({"repo_url": "https://github.com/a/b"}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod child_sync {
    use registry_server::entity::{input, output, plugin_env_variable, plugin_tag, runtime};
    use sea_orm::*;
    use serde_json::Value;

    use super::*;

    fn descriptor_with_env(id: &str) -> String {
        format!(
            "{}execution:\n  envVariables:\n    - name: API_URL\n      label: Service URL\n      type: text\n      default: https://api.example.org\n",
            descriptor(id, "Peak Caller", "1.0.0")
        )
    }

    /// Stored child rows without their surrogate ids.
    async fn child_rows(db: &DatabaseConnection, plugin_id: &str) -> Value {
        let inputs = input::Entity::find()
            .filter(input::Column::PluginId.eq(plugin_id))
            .order_by_asc(input::Column::Position)
            .all(db)
            .await
            .unwrap();
        let outputs = output::Entity::find()
            .filter(output::Column::PluginId.eq(plugin_id))
            .order_by_asc(output::Column::Position)
            .all(db)
            .await
            .unwrap();
        let env = plugin_env_variable::Entity::find()
            .filter(plugin_env_variable::Column::PluginId.eq(plugin_id))
            .order_by_asc(plugin_env_variable::Column::Position)
            .all(db)
            .await
            .unwrap();
        let runtimes = runtime::Entity::find()
            .filter(runtime::Column::PluginId.eq(plugin_id))
            .all(db)
            .await
            .unwrap();
        let mut tag_ids: Vec<i32> = plugin_tag::Entity::find()
            .filter(plugin_tag::Column::PluginId.eq(plugin_id))
            .all(db)
            .await
            .unwrap()
            .into_iter()
            .map(|pt| pt.tag_id)
            .collect();
        tag_ids.sort_unstable();

        json!({
            "inputs": inputs.iter().map(|i| json!([
                i.position, i.name, i.label, i.kind, i.required, i.default_value,
                i.description, i.placeholder, i.file_types, i.multiple, i.source_file,
                i.min_value, i.max_value, i.step
            ])).collect::<Vec<_>>(),
            "outputs": outputs.iter().map(|o| json!([
                o.position, o.name, o.path, o.kind, o.description, o.format
            ])).collect::<Vec<_>>(),
            "env": env.iter().map(|e| json!([
                e.position, e.name, e.label, e.kind, e.required, e.default_value,
                e.description, e.placeholder, e.file_types, e.multiple, e.source_file,
                e.min_value, e.max_value, e.step, e.accept
            ])).collect::<Vec<_>>(),
            "runtime": runtimes.iter().map(|r| json!([r.environments, r.entrypoint])).collect::<Vec<_>>(),
            "tags": tag_ids,
        })
    }

    #[tokio::test]
    async fn descriptor_without_components_stores_no_child_rows() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let repo = GitFixture::empty();
        repo.write("plugin.yaml", "plugin:\n  id: bare-tool\n");
        repo.commit("initial");

        let res = app.submit(&repo.url(), &token).await;

        assert_eq!(res.body["inputs"], json!([]));
        assert_eq!(res.body["outputs"], json!([]));
        assert_eq!(res.body["env_variables"], json!([]));
        assert_eq!(res.body["runtime"], Value::Null);
        assert_eq!(
            child_rows(&app.db, "bare-tool").await,
            json!({"inputs": [], "outputs": [], "env": [], "runtime": [], "tags": []})
        );
    }

    #[tokio::test]
    async fn reingesting_unchanged_repository_keeps_identical_rows() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let repo = GitFixture::plugin("peak-caller");
        repo.write("plugin.yaml", &descriptor_with_env("peak-caller"));
        repo.commit("env");

        let first = app.submit(&repo.url(), &token).await;
        let before = child_rows(&app.db, "peak-caller").await;
        assert_eq!(before["inputs"].as_array().unwrap().len(), 2);
        assert_eq!(before["env"].as_array().unwrap().len(), 1);

        let second = app
            .post_with_token(&routes::refresh("peak-caller"), &json!({}), &token)
            .await;
        assert_eq!(second.status, 200, "{}", second.text);

        assert_eq!(child_rows(&app.db, "peak-caller").await, before);
        for field in ["runtime", "inputs", "outputs", "env_variables", "tags"] {
            assert_eq!(second.body[field], first.body[field], "{field} changed");
        }
    }

    #[tokio::test]
    async fn refresh_drops_components_removed_upstream() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let repo = GitFixture::plugin("peak-caller");
        repo.write("plugin.yaml", &descriptor_with_env("peak-caller"));
        repo.commit("env");
        app.submit(&repo.url(), &token).await;

        repo.write(
            "plugin.yaml",
            "plugin:\n  id: peak-caller\n  name: Peak Caller\nruntime:\n  environments: [python]\n  entrypoint: main.py\n",
        );
        repo.commit("drop parameters");

        let res = app
            .post_with_token(&routes::refresh("peak-caller"), &json!({}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["inputs"], json!([]));
        assert_eq!(res.body["outputs"], json!([]));
        assert_eq!(res.body["env_variables"], json!([]));
        assert_eq!(res.body["tags"], json!([]));
        let rows = child_rows(&app.db, "peak-caller").await;
        assert_eq!(rows["inputs"], json!([]));
        assert_eq!(rows["outputs"], json!([]));
        assert_eq!(rows["env"], json!([]));
        assert_eq!(rows["tags"], json!([]));
        assert_eq!(rows["runtime"].as_array().unwrap().len(), 1);
    }
}
