use libxml::parser::Parser;
use libxml::tree::Document as LibxmlDocument;
use libxml::xpath::Context;
use url::Url;

use crate::node::Node;

#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("failed to parse HTML: {0}")]
    Parse(String),
    #[error("invalid XPath expression {expr:?}: {detail}")]
    Xpath { expr: String, detail: String },
}

pub type Result<T> = std::result::Result<T, HtmlError>;

/// A parsed HTTP response body, tolerant of malformed markup the way a
/// browser (or `lxml.html`) would be, rather than a strict XML parser.
pub struct Document {
    base_url: Url,
    inner: LibxmlDocument,
    raw_body: Vec<u8>,
}

impl Document {
    pub fn parse(body: &str, base_url: Url) -> Result<Self> {
        let parser = Parser::default_html();
        let inner = parser
            .parse_string(body)
            .map_err(|e| HtmlError::Parse(format!("{e:?}")))?;
        Ok(Document {
            base_url,
            inner,
            raw_body: body.as_bytes().to_vec(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The unparsed response body, used verbatim for a leaf node with no
    /// `file_content` extractor (spec §4.5.2 step 4).
    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    pub fn root(&self) -> Option<Node> {
        self.inner.get_root_element().map(Node::new)
    }

    /// Evaluates an XPath expression against the whole document, returning
    /// every matched node.
    pub fn xpath(&self, expr: &str) -> Result<Vec<Node>> {
        self.xpath_scoped(expr, None)
    }

    /// Evaluates an XPath expression against each node of `content_node` in
    /// turn (or the whole document when `content_node` is empty), the way
    /// every XPath-flavored option in a structure node is scoped by its
    /// parent's `content` selector.
    pub fn xpath_scoped(&self, expr: &str, content_node: Option<&[Node]>) -> Result<Vec<Node>> {
        let ctx = Context::new(&self.inner).map_err(|_| HtmlError::Xpath {
            expr: expr.to_string(),
            detail: "failed to create XPath context".to_string(),
        })?;

        match content_node {
            None | Some([]) => {
                let obj = ctx.evaluate(expr).map_err(|_| HtmlError::Xpath {
                    expr: expr.to_string(),
                    detail: "evaluation failed".to_string(),
                })?;
                Ok(obj.get_nodes_as_vec().into_iter().map(Node::new).collect())
            }
            Some(scopes) => {
                let mut out = Vec::new();
                for scope in scopes {
                    let obj = ctx
                        .findnodes(expr, Some(scope.inner()))
                        .map_err(|_| HtmlError::Xpath {
                            expr: expr.to_string(),
                            detail: "evaluation failed".to_string(),
                        })?;
                    out.extend(obj.into_iter().map(Node::new));
                }
                Ok(out)
            }
        }
    }

    /// Evaluates `boolean(expr)`. Per the `assert` option's contract, the
    /// result is false only for an explicit `"0"`/`"false"` string form or an
    /// empty node-set; anything else is truthy.
    pub fn xpath_bool(&self, expr: &str) -> Result<bool> {
        let ctx = Context::new(&self.inner).map_err(|_| HtmlError::Xpath {
            expr: expr.to_string(),
            detail: "failed to create XPath context".to_string(),
        })?;
        let obj = ctx
            .evaluate(&format!("boolean({expr})"))
            .map_err(|_| HtmlError::Xpath {
                expr: expr.to_string(),
                detail: "evaluation failed".to_string(),
            })?;
        let content = obj.get_content();
        Ok(!(content == "0" || content == "false" || content.is_empty()))
    }
}
