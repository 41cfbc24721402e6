use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Process joined with its client and product names.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub id: u64,
    #[schema(example = "Field verification")]
    pub name: String,
    #[serde(rename = "clientId")]
    pub customer_id: u64,
    #[serde(rename = "clientName")]
    pub customer_name: String,
    pub product_id: Option<u64>,
    pub product_name: Option<String>,
    pub description: Option<String>,
    /// Key used to match planned and received collections
    #[sqlx(skip)]
    #[serde(default)]
    #[schema(example = "Acme Bank - Home Loans")]
    pub label: String,
}

impl Process {
    /// `"<client> - <product>"`, or `"<client> - <process>"` without a product.
    pub fn with_label(mut self) -> Self {
        let right = self.product_name.as_deref().unwrap_or(&self.name);
        self.label = format!("{} - {}", self.customer_name, right);
        self
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProcess {
    pub name: String,
    #[serde(rename = "clientId")]
    pub customer_id: u64,
    pub product_id: Option<u64>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProcessQuery {
    pub client_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process(product: Option<&str>) -> Process {
        Process {
            id: 1,
            name: "Field verification".to_string(),
            customer_id: 1,
            customer_name: "Acme Bank".to_string(),
            product_id: product.map(|_| 9),
            product_name: product.map(str::to_string),
            description: None,
            label: String::new(),
        }
    }

    #[test]
    fn label_prefers_product() {
        assert_eq!(process(Some("Home Loans")).with_label().label, "Acme Bank - Home Loans");
        assert_eq!(process(None).with_label().label, "Acme Bank - Field verification");
    }
}
