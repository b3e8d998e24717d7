use rmcp::{Error as McpError, ServerHandler, model::*, tool};

use super::registry::*;

/// MCP handler exposing the doc-tools operations
#[derive(Clone)]
pub struct DocTools {
    ctx: ToolContext,
}

fn respond(outcome: crate::error::ToolOutcome) -> Result<CallToolResult, McpError> {
    let body = vec![Content::text(outcome.to_json())];
    if outcome.success {
        Ok(CallToolResult::success(body))
    } else {
        Ok(CallToolResult::error(body))
    }
}

#[tool(tool_box)]
impl DocTools {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn call(&self, invocation: ToolInvocation) -> Result<CallToolResult, McpError> {
        respond(invocation.dispatch(&self.ctx).await)
    }

    #[tool(description = "Get the latest Redpanda release version and Docker repository")]
    async fn get_redpanda_version(&self, #[tool(aggr)] req: VersionRequest) -> Result<CallToolResult, McpError> {
        self.call(ToolInvocation::GetRedpandaVersion(req)).await
    }

    #[tool(description = "Get the latest Redpanda Console release version and Docker repository")]
    async fn get_console_version(&self, #[tool(aggr)] req: VersionRequest) -> Result<CallToolResult, McpError> {
        self.call(ToolInvocation::GetConsoleVersion(req)).await
    }

    #[tool(description = "Get the Redpanda Helm chart versions matching stable and beta Docker tags")]
    async fn get_helm_chart_versions(
        &self,
        #[tool(aggr)] req: HelmChartVersionsRequest,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolInvocation::GetHelmChartVersions(req)).await
    }

    #[tool(description = "Generate the Redpanda configuration property reference for a tag")]
    async fn generate_property_docs(
        &self,
        #[tool(aggr)] req: PropertyDocsRequest,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolInvocation::GeneratePropertyDocs(req)).await
    }

    #[tool(description = "Generate the metrics reference by scraping a running broker")]
    async fn generate_metrics_docs(
        &self,
        #[tool(aggr)] req: MetricsDocsRequest,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolInvocation::GenerateMetricsDocs(req)).await
    }

    #[tool(description = "Generate the rpk command reference from rpk --help output")]
    async fn generate_rpk_docs(&self, #[tool(aggr)] req: RpkDocsRequest) -> Result<CallToolResult, McpError> {
        self.call(ToolInvocation::GenerateRpkDocs(req)).await
    }

    #[tool(description = "Generate the Redpanda Connect connector catalog and diff it against a previous release")]
    async fn generate_rpcn_connector_docs(
        &self,
        #[tool(aggr)] req: ConnectorDocsRequest,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolInvocation::GenerateRpcnConnectorDocs(req)).await
    }

    #[tool(description = "Generate Helm chart value references with helm-docs and pandoc")]
    async fn generate_helm_docs(&self, #[tool(aggr)] req: HelmDocsRequest) -> Result<CallToolResult, McpError> {
        self.call(ToolInvocation::GenerateHelmDocs(req)).await
    }

    #[tool(description = "Render the cloud regions table from the regions master data")]
    async fn generate_cloud_regions(
        &self,
        #[tool(aggr)] req: CloudRegionsRequest,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolInvocation::GenerateCloudRegions(req)).await
    }

    #[tool(description = "Generate the Kubernetes CRD reference with crd-ref-docs")]
    async fn generate_crd_docs(&self, #[tool(aggr)] req: CrdDocsRequest) -> Result<CallToolResult, McpError> {
        self.call(ToolInvocation::GenerateCrdDocs(req)).await
    }

    #[tool(description = "Bundle and validate the OpenAPI document of an API surface from its proto sources")]
    async fn bundle_openapi(&self, #[tool(aggr)] req: BundleOpenapiRequest) -> Result<CallToolResult, McpError> {
        self.call(ToolInvocation::BundleOpenapi(req)).await
    }

    #[tool(description = "Compare published OpenAPI descriptions against the proto-generated spec and locate the RPCs to fix")]
    async fn compare_proto_descriptions(
        &self,
        #[tool(aggr)] req: CompareProtoRequest,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolInvocation::CompareProtoDescriptions(req)).await
    }

    #[tool(description = "Review generated documentation for placeholders, template leftovers, empty descriptions, bad xrefs and heading problems")]
    async fn review_generated_docs(&self, #[tool(aggr)] req: ReviewRequest) -> Result<CallToolResult, McpError> {
        self.call(ToolInvocation::ReviewGeneratedDocs(req)).await
    }

    #[tool(description = "Run a doc-tools CLI command. Shell metacharacters and path traversal are rejected")]
    async fn run_doc_tools_command(
        &self,
        #[tool(aggr)] req: RunCommandRequest,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolInvocation::RunDocToolsCommand(req)).await
    }

    #[tool(description = "Get the status and result of a background job")]
    async fn get_job_status(&self, #[tool(aggr)] req: JobStatusRequest) -> Result<CallToolResult, McpError> {
        self.call(ToolInvocation::GetJobStatus(req)).await
    }

    #[tool(description = "List background jobs submitted in the last hour")]
    async fn list_jobs(&self) -> Result<CallToolResult, McpError> {
        self.call(ToolInvocation::ListJobs(ListJobsRequest {})).await
    }
}

#[tool(tool_box)]
impl ServerHandler for DocTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some("This server generates and checks Redpanda reference documentation. Use the get_*_version tools for release metadata, the generate_* tools to regenerate reference pages, compare_proto_descriptions and review_generated_docs to check output, and pass background: true to long generators, then poll get_job_status.".to_string()),
        }
    }
}
